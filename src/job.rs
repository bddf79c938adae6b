//! One cycle of the scheduled rate update.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::feed::{CnbFeed, CsobFeed};
use crate::manager::{CurrencyManager, RefreshReport};
use crate::store::ConstantStore;
use crate::trend::{CNB_KEY, CSOB_KEY};

const RULE: &str = "==============================================";

pub struct UpdateJob {
    manager: Arc<CurrencyManager>,
    csob: CsobFeed,
    cnb: CnbFeed,
    constants: Arc<dyn ConstantStore>,
    trend_code: String,
}

impl UpdateJob {
    pub fn new(
        manager: Arc<CurrencyManager>,
        csob: CsobFeed,
        cnb: CnbFeed,
        constants: Arc<dyn ConstantStore>,
        trend_code: &str,
    ) -> Self {
        Self {
            manager,
            csob,
            cnb,
            constants,
            trend_code: trend_code.to_string(),
        }
    }

    /// Refreshes the trend constants and then the stored rates. `now` is
    /// local time; progress goes to `out`.
    pub async fn run(&self, now: NaiveDateTime, out: &mut impl Write) -> Result<RefreshReport> {
        writeln!(out, "{}", RULE)?;
        writeln!(out, "           Updating exchange rates")?;
        writeln!(out)?;

        writeln!(out, "loading CSOB...")?;
        let csob = self.csob.trend(&self.trend_code, now.date()).await;
        writeln!(out, "Done")?;

        writeln!(out, "loading CNB...")?;
        let cnb = self.cnb.trend(&self.trend_code, now).await;
        writeln!(out, "Done")?;

        self.constants
            .set(CSOB_KEY, &serde_json::to_string(&csob)?)
            .await?;
        self.constants.set(CNB_KEY, &serde_json::to_string(&cnb)?).await?;

        let report = self.manager.refresh_rates().await?;
        writeln!(
            out,
            "Currencies were updated ({} updated, {} ignored).",
            report.updated, report.ignored
        )?;

        writeln!(out)?;
        writeln!(out, "                   Finished")?;
        writeln!(out, "{}", RULE)?;

        Ok(report)
    }
}
