use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::data::loader::load_snapshot;
use crate::state::Summaries;
use crate::ui::fmt_opt;

/// Load the data directory and print every summary table to stdout.
pub fn run(config: &DashboardConfig) -> Result<()> {
    let snapshot = load_snapshot(config)
        .with_context(|| format!("loading data from {}", config.data_dir.display()))?;
    let summaries = Summaries::build(Arc::new(snapshot), config);
    write_report(&summaries, io::stdout().lock()).context("writing report")
}

pub fn write_report<W: Write>(summaries: &Summaries, mut out: W) -> io::Result<()> {
    writeln!(out, "== Overview ==")?;
    for row in &summaries.overview {
        writeln!(out, "{}\tEC {:.1}\t{} specimens", row.group, row.target_ec, row.specimens)?;
    }
    writeln!(
        out,
        "total {} specimens, mean temperature {} ℃, mean humidity {} %",
        summaries.total_specimens(),
        fmt_opt(summaries.mean_temperature, 1),
        fmt_opt(summaries.mean_humidity, 1)
    )?;

    writeln!(out, "\n== Environment ==")?;
    writeln!(out, "group\ttarget EC\ttemperature\thumidity\tpH\tmeasured EC")?;
    for row in &summaries.environment.rows {
        writeln!(
            out,
            "{}\t{:.1}\t{}\t{}\t{}\t{}",
            row.group,
            row.target_ec,
            fmt_opt(row.temperature, 2),
            fmt_opt(row.humidity, 2),
            fmt_opt(row.ph, 2),
            fmt_opt(row.ec, 2)
        )?;
    }

    writeln!(out, "\n== Growth ==")?;
    writeln!(out, "group\tEC\tfresh weight\tleaf count\tshoot length\tspecimens")?;
    for row in &summaries.growth.rows {
        writeln!(
            out,
            "{}\t{:.1}\t{}\t{}\t{}\t{}",
            row.group,
            row.target_ec,
            fmt_opt(row.fresh_weight, 2),
            fmt_opt(row.leaf_count, 2),
            fmt_opt(row.shoot_length, 2),
            row.specimens
        )?;
    }
    if let Some(best) = &summaries.best {
        writeln!(
            out,
            "best fresh weight: {} ({} g, EC {:.1})",
            best.group,
            fmt_opt(best.fresh_weight, 2),
            best.target_ec
        )?;
    }
    if let Some(trend) = &summaries.trend {
        writeln!(
            out,
            "trend: fresh weight = {:.3} × EC + {:.3} (r² {})",
            trend.slope,
            trend.intercept,
            fmt_opt(trend.r_squared, 3)
        )?;
    }

    let mut unmapped = summaries.environment.unmapped.clone();
    unmapped.extend(summaries.growth.unmapped.iter().cloned());
    unmapped.sort();
    unmapped.dedup();
    if !unmapped.is_empty() {
        writeln!(out, "\ngroups without a target EC (excluded): {}", unmapped.join(", "))?;
    }
    for failure in &summaries.snapshot.failures {
        writeln!(out, "skipped: {failure}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcMapping, FileSettings};
    use crate::data::fixtures::{env_table, growth_table};
    use crate::data::model::{EnvironmentTables, GrowthTables, Snapshot};

    #[test]
    fn report_lists_groups_best_and_exclusions() {
        let mut environment = EnvironmentTables::new();
        environment.insert(
            "송도고".into(),
            env_table("송도고", &[[Some(20.0), Some(50.0), Some(6.0), Some(1.0)]]),
        );
        environment.insert(
            "기타".into(),
            env_table("기타", &[[Some(1.0), Some(1.0), Some(1.0), Some(1.0)]]),
        );
        let mut growth = GrowthTables::new();
        growth.insert("송도고".into(), growth_table("송도고", &[[4.5, 6.0, 70.0]]));
        growth.insert("하늘고".into(), growth_table("하늘고", &[[9.5, 8.0, 90.0]]));
        let snapshot = Snapshot {
            environment,
            growth,
            failures: Vec::new(),
        };

        let config = DashboardConfig::new("data", FileSettings::default());
        assert_eq!(config.groups, EcMapping::default());
        let summaries = Summaries::build(Arc::new(snapshot), &config);

        let mut out = Vec::new();
        write_report(&summaries, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("best fresh weight: 하늘고 (9.50 g, EC 2.0)"));
        assert!(text.contains("groups without a target EC (excluded): 기타"));
        assert!(text.contains("아라고\tEC 4.0\t0 specimens"));
    }
}
