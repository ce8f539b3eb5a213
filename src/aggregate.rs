use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::error::{PlotError, Result};
use crate::perf::{
    AverageSample, RunSample, ThreadTiming, AVERAGE_TIME_SEC, RUN, THREADS, TIME_SEC,
};
use crate::perf_csv::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// One row per timed run: Threads, Run, TimeSec.
    Runs,
    /// One row per thread count: Threads, AverageTimeSec.
    Averaged,
}

pub fn detect_schema(table: &Table) -> Result<Schema> {
    let schema = if table.has_column(RUN) && table.has_column(TIME_SEC) {
        Schema::Runs
    } else if table.has_column(AVERAGE_TIME_SEC) {
        Schema::Averaged
    } else {
        return Err(PlotError::Schema {
            found: table.headers().into_iter().map(String::from).collect(),
        });
    };

    if !table.has_column(THREADS) {
        return Err(PlotError::MissingColumn(THREADS));
    }
    Ok(schema)
}

/// Reduces a loaded table to one (threads, average time) point per thread count,
/// sorted by thread count.
pub fn summarize(table: &Table) -> Result<Vec<ThreadTiming>> {
    let schema = detect_schema(table)?;
    debug!(?schema, rows = table.len(), "detected schema");
    if table.is_empty() {
        warn!("table has no data rows");
    }

    let summary = match schema {
        Schema::Runs => average_runs(&table.rows::<RunSample>()?),
        Schema::Averaged => sort_averages(table.rows::<AverageSample>()?),
    };

    for timing in &summary {
        debug!(
            threads = timing.threads,
            average_time_sec = timing.average_time_sec,
            "summary"
        );
    }
    Ok(summary)
}

/// Groups runs by thread count and takes the mean time of each group.
pub fn average_runs(samples: &[RunSample]) -> Vec<ThreadTiming> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();

    for sample in samples {
        trace!(threads = sample.threads, run = sample.run, time_sec = sample.time_sec);
        groups.entry(sample.threads).or_default().push(sample.time_sec);
    }

    groups
        .into_iter()
        .map(|(threads, times)| ThreadTiming {
            threads,
            average_time_sec: mean(&times),
        })
        .collect()
}

/// Orders pre-averaged rows by thread count. A thread count listed more than
/// once is folded into a single row holding the mean of its values.
pub fn sort_averages(samples: Vec<AverageSample>) -> Vec<ThreadTiming> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();

    for sample in samples {
        groups
            .entry(sample.threads)
            .or_default()
            .push(sample.average_time_sec);
    }

    groups
        .into_iter()
        .map(|(threads, values)| {
            if values.len() > 1 {
                warn!(threads, count = values.len(), "duplicate thread count, averaging");
            }
            ThreadTiming {
                threads,
                average_time_sec: mean(&values),
            }
        })
        .collect()
}

// Running mean, so large finite times cannot overflow a plain sum.
// Callers never pass an empty slice: every group holds at least one value.
fn mean(values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, v)| acc + (v - acc) / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(data: &str) -> Table {
        Table::from_reader(data.as_bytes()).unwrap()
    }

    fn pairs(summary: &[ThreadTiming]) -> Vec<(u32, f64)> {
        summary
            .iter()
            .map(|t| (t.threads, t.average_time_sec))
            .collect()
    }

    #[test]
    fn test_runs_are_averaged_per_thread_count() {
        let t = table("Threads;Run;TimeSec\n2;1;1,0\n2;2;3,0\n4;1;0,5\n");

        assert_eq!(detect_schema(&t).unwrap(), Schema::Runs);
        let summary = summarize(&t).unwrap();
        assert_eq!(pairs(&summary), vec![(2, 2.0), (4, 0.5)]);
    }

    #[test]
    fn test_averaged_rows_are_sorted() {
        let t = table("Threads;AverageTimeSec\n4;0,5\n2;2,0\n");

        assert_eq!(detect_schema(&t).unwrap(), Schema::Averaged);
        let summary = summarize(&t).unwrap();
        assert_eq!(pairs(&summary), vec![(2, 2.0), (4, 0.5)]);
    }

    #[test]
    fn test_sort_is_numeric_not_lexicographic() {
        let t = table("Threads;AverageTimeSec\n16;0,25\n2;2,0\n8;0,5\n1;4,0\n");

        let threads: Vec<u32> = summarize(&t).unwrap().iter().map(|t| t.threads).collect();
        assert_eq!(threads, vec![1, 2, 8, 16]);
    }

    #[test]
    fn test_mean_of_many_runs() {
        let samples: Vec<RunSample> = [1.0, 2.0, 4.5, 0.5]
            .iter()
            .enumerate()
            .map(|(i, &time_sec)| RunSample {
                threads: 3,
                run: i as u32 + 1,
                time_sec,
            })
            .collect();

        let summary = average_runs(&samples);
        assert_eq!(summary.len(), 1);
        assert!((summary[0].average_time_sec - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_huge_times_stays_finite() {
        let samples = [
            RunSample { threads: 1, run: 1, time_sec: 1e308 },
            RunSample { threads: 1, run: 2, time_sec: 1e308 },
        ];

        let summary = average_runs(&samples);
        assert!(summary[0].average_time_sec.is_finite());
        assert!((summary[0].average_time_sec - 1e308).abs() <= 1e308 * 1e-12);
    }

    #[test]
    fn test_empty_time_reports_column_and_row() {
        let t = table("Threads;Run;TimeSec\n2;1;\n2;2;3,0\n");

        match summarize(&t) {
            Err(PlotError::Parse { column, row, value }) => {
                assert_eq!(column, TIME_SEC);
                assert_eq!(row, 1);
                assert_eq!(value, "");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_count_matches_distinct_threads() {
        let t = table(
            "Threads;Run;TimeSec\n\
             1;1;4,0\n8;1;0,6\n2;1;2,1\n1;2;4,2\n8;2;0,4\n4;1;1,1\n2;2;1,9\n",
        );

        let summary = summarize(&t).unwrap();
        assert_eq!(summary.len(), 4);
        assert_eq!(
            summary.iter().map(|t| t.threads).collect::<Vec<_>>(),
            vec![1, 2, 4, 8]
        );
    }

    #[test]
    fn test_runs_take_precedence_over_average_column() {
        let t = table("Threads;Run;TimeSec;AverageTimeSec\n2;1;1,0;9,0\n2;2;3,0;9,0\n");

        assert_eq!(detect_schema(&t).unwrap(), Schema::Runs);
        assert_eq!(pairs(&summarize(&t).unwrap()), vec![(2, 2.0)]);
    }

    #[test]
    fn test_duplicate_averaged_threads_are_folded() {
        let summary = sort_averages(vec![
            AverageSample { threads: 2, average_time_sec: 1.0 },
            AverageSample { threads: 1, average_time_sec: 5.0 },
            AverageSample { threads: 2, average_time_sec: 2.0 },
        ]);

        assert_eq!(pairs(&summary), vec![(1, 5.0), (2, 1.5)]);
    }

    #[test]
    fn test_unknown_columns_are_a_schema_error() {
        let t = table("Threads;Seconds\n2;1,0\n");

        match summarize(&t) {
            Err(PlotError::Schema { found }) => assert_eq!(found, vec!["Threads", "Seconds"]),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_without_time_is_a_schema_error() {
        let t = table("Threads;Run\n2;1\n");
        assert!(matches!(detect_schema(&t), Err(PlotError::Schema { .. })));
    }

    #[test]
    fn test_missing_threads_column() {
        let t = table("Run;TimeSec\n1;1,0\n");
        assert!(matches!(
            detect_schema(&t),
            Err(PlotError::MissingColumn(THREADS))
        ));
    }

    #[test]
    fn test_header_only_table_summarizes_to_nothing() {
        let t = table("Threads;Run;TimeSec\n");
        assert!(summarize(&t).unwrap().is_empty());
    }
}
