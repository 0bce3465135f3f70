//! Tabular statistics export.
//!
//! The layout (title, summary block, per-game block, blank separators and
//! header text) is fixed so that files line up with earlier exports.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

use crate::stats::Statistics;

pub const TITLE: &str = "Zetamac Tracker Statistics Export";
pub const GAME_HEADER: [&str; 6] = [
    "Date",
    "Time",
    "Score",
    "Accuracy",
    "Problems Solved",
    "Duration (seconds)",
];

pub fn local_date(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%-m/%-d/%Y").to_string()
}

pub fn local_time(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%-I:%M:%S %p").to_string()
}

fn write_block<I, R>(rows: I) -> crate::Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render_csv(stats: &Statistics, exported_at: DateTime<Local>) -> crate::Result<String> {
    let stamp = exported_at
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let header = write_block([vec![TITLE.to_string()], vec!["Export Date".to_string(), stamp]])?;

    let summary = write_block([
        vec!["Summary Statistics".to_string()],
        vec!["Metric".to_string(), "Value".to_string()],
        vec!["Total Games".to_string(), stats.total_games.to_string()],
        vec!["Best Score".to_string(), stats.best_score.to_string()],
        vec!["Average Score".to_string(), stats.average_score().to_string()],
        vec!["Best Accuracy".to_string(), format!("{}%", stats.best_accuracy)],
    ])?;

    let mut rows = vec![
        vec!["Individual Games".to_string()],
        GAME_HEADER.iter().map(|h| h.to_string()).collect(),
    ];
    rows.extend(stats.recent_games.iter().map(|game| {
        vec![
            local_date(&game.date),
            local_time(&game.date),
            game.score.to_string(),
            format!("{}%", game.accuracy),
            game.problems_solved.to_string(),
            game.duration.to_string(),
        ]
    }));
    let games = write_block(rows)?;

    Ok(format!("{header}\n{summary}\n{games}"))
}

pub fn default_file_name(exported_at: DateTime<Local>) -> String {
    format!(
        "zetamac_statistics_{}.csv",
        exported_at.with_timezone(&Utc).format("%Y-%m-%d")
    )
}

/// Write the export. `out` may name a file or an existing directory (the
/// default file name is used inside it); `None` means the working directory.
pub fn export_to(
    stats: &Statistics,
    exported_at: DateTime<Local>,
    out: Option<&Path>,
) -> crate::Result<PathBuf> {
    let path = match out {
        Some(p) if p.is_dir() => p.join(default_file_name(exported_at)),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(default_file_name(exported_at)),
    };
    let csv = render_csv(stats, exported_at)?;
    std::fs::write(&path, csv)?;
    tracing::info!(path = %path.display(), games = stats.recent_games.len(), "statistics exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::GameResult;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn local(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn sample() -> Statistics {
        let mut stats = Statistics::default();
        stats.record(GameResult {
            score: 28,
            accuracy: 93,
            problems_solved: 30,
            duration: 120,
            date: local(9, 30, 0).with_timezone(&Utc),
        });
        stats.record(GameResult {
            score: 35,
            accuracy: 97,
            problems_solved: 36,
            duration: 120,
            date: local(14, 5, 9).with_timezone(&Utc),
        });
        stats
    }

    #[test]
    fn layout_matches_legacy_export() {
        let exported_at = local(15, 0, 0);
        let csv = render_csv(&sample(), exported_at).unwrap();
        let stamp = exported_at
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let expected = format!(
            "Zetamac Tracker Statistics Export\n\
             Export Date,{stamp}\n\
             \n\
             Summary Statistics\n\
             Metric,Value\n\
             Total Games,2\n\
             Best Score,35\n\
             Average Score,32\n\
             Best Accuracy,97%\n\
             \n\
             Individual Games\n\
             Date,Time,Score,Accuracy,Problems Solved,Duration (seconds)\n\
             5/1/2024,2:05:09 PM,35,97%,36,120\n\
             5/1/2024,9:30:00 AM,28,93%,30,120\n"
        );
        assert_eq!(csv, expected);
    }

    #[test]
    fn empty_statistics_export_has_headers_only() {
        let csv = render_csv(&Statistics::default(), local(8, 0, 0)).unwrap();
        assert!(csv.contains("Total Games,0\n"));
        assert!(csv.contains("Average Score,0\n"));
        assert!(csv.ends_with("Date,Time,Score,Accuracy,Problems Solved,Duration (seconds)\n"));
    }

    #[test]
    fn export_into_directory_uses_default_name() {
        let dir = tempdir().unwrap();
        let exported_at = local(12, 0, 0);
        let path = export_to(&sample(), exported_at, Some(dir.path())).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            default_file_name(exported_at)
        );
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with(TITLE));
    }

    #[test]
    fn default_name_uses_export_day() {
        let exported_at = Utc
            .with_ymd_and_hms(2025, 1, 31, 12, 0, 0)
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(
            default_file_name(exported_at),
            "zetamac_statistics_2025-01-31.csv"
        );
    }
}
