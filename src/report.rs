use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome record for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn passed(scenario: &str, seed: u64, started_at: DateTime<Utc>, duration_ms: u64) -> Self {
        ScenarioReport {
            scenario: scenario.to_string(),
            passed: true,
            failure: None,
            seed,
            started_at,
            duration_ms,
        }
    }

    pub fn failed(
        scenario: &str,
        seed: u64,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        failure: String,
    ) -> Self {
        ScenarioReport {
            scenario: scenario.to_string(),
            passed: false,
            failure: Some(failure),
            seed,
            started_at,
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
    pub seed: u64,
}

impl RunReport {
    pub fn new(seed: u64, scenarios: Vec<ScenarioReport>) -> Self {
        let passed = scenarios.iter().filter(|r| r.passed).count();
        let failed = scenarios.len() - passed;
        RunReport {
            scenarios,
            passed,
            failed,
            seed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn print_json(&self) -> Result<()> {
        println!("{}", serde_json::to_string(self)?);
        Ok(())
    }

    pub fn print_porcelain(&self) {
        for report in &self.scenarios {
            println!(
                "{}\t{}\t{}\t{}",
                report.scenario,
                if report.passed { "pass" } else { "fail" },
                report.seed,
                report.duration_ms
            );
        }
    }

    pub fn print_human(&self) {
        let name_width = self
            .scenarios
            .iter()
            .map(|r| r.scenario.len())
            .max()
            .unwrap_or(0)
            .max(16);

        println!(
            "{:<width$}{:<8}{:>12}",
            "SCENARIO",
            "RESULT",
            "TIME",
            width = name_width + 2
        );
        println!("{}", "─".repeat(name_width + 2 + 8 + 12));

        for report in &self.scenarios {
            println!(
                "{:<width$}{:<8}{:>10}ms",
                report.scenario,
                if report.passed { "pass" } else { "FAIL" },
                report.duration_ms,
                width = name_width + 2
            );
            if let Some(failure) = &report.failure {
                println!("  {}", failure);
            }
        }

        println!();
        if self.all_passed() {
            println!("{} scenario(s) passed (seed {})", self.passed, self.seed);
        } else {
            println!(
                "{} passed, {} FAILED (seed {} reproduces this run)",
                self.passed, self.failed, self.seed
            );
        }
    }
}
