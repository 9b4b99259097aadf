use std::io::{self, Write};

use hostup_core::models::{UpgradeCandidate, UpgradeStatus};
use hostup_core::orchestration::{RunOutcome, RunSummary};
use hostup_core::reconcile::Reconciliation;

pub fn print_plan(plan: &Reconciliation, out: &mut impl Write) -> io::Result<()> {
    if !plan.excluded.is_empty() {
        writeln!(out, "Excluded ({}):", plan.excluded.len())?;
        for candidate in &plan.excluded {
            writeln!(out, "  {}", describe(candidate))?;
        }
    }
    writeln!(out, "Pending upgrades ({}):", plan.accepted.len())?;
    for candidate in &plan.accepted {
        writeln!(out, "  {}", describe(candidate))?;
    }
    Ok(())
}

pub fn print_summary(summary: &RunSummary, out: &mut impl Write) -> io::Result<()> {
    match summary.outcome {
        RunOutcome::NothingToDo => {
            writeln!(
                out,
                "Nothing to upgrade ({} discovered, {} excluded).",
                summary.discovered,
                summary.excluded.len()
            )?;
        }
        RunOutcome::ListOnly => {
            let plan = Reconciliation {
                accepted: summary.planned.clone(),
                excluded: summary.excluded.clone(),
            };
            print_plan(&plan, out)?;
        }
        RunOutcome::Declined => writeln!(out, "Upgrade cancelled.")?,
        RunOutcome::Completed => {
            for result in &summary.results {
                let marker = match result.status {
                    UpgradeStatus::Success => "ok",
                    UpgradeStatus::Failed => "FAILED",
                    UpgradeStatus::Error => "ERROR",
                };
                writeln!(
                    out,
                    "  [{marker}] {} ({}) exit code {}",
                    result.name, result.id, result.exit_code
                )?;
            }
            writeln!(
                out,
                "{} succeeded, {} failed, {} error(s).",
                summary.succeeded(),
                summary.failed(),
                summary.errored()
            )?;
        }
    }
    Ok(())
}

fn describe(candidate: &UpgradeCandidate) -> String {
    format!(
        "{} ({}) {} -> {} [{}]",
        candidate.name,
        candidate.id,
        candidate.current_version.as_deref().unwrap_or("?"),
        candidate.available_version.as_deref().unwrap_or("?"),
        candidate.manager.as_str()
    )
}
