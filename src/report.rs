//! Benchmark result records, table and CSV rendering.

use std::fmt::Write;

/// One timed solve: which variant, how big, how parallel, how fast.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub method: String,
    pub size: usize,
    pub threads: usize,
    /// Wall-clock seconds.
    pub time: f64,
    /// Baseline time divided by this run's time.
    pub speedup: f64,
    /// Speedup divided by the worker count.
    pub efficiency: f64,
}

impl RunRecord {
    /// Build a record relative to the sequential baseline time.
    pub fn new(method: &str, size: usize, threads: usize, time: f64, baseline: f64) -> Self {
        let speedup = baseline / time;
        RunRecord {
            method: method.to_string(),
            size,
            threads,
            time,
            speedup,
            efficiency: speedup / threads as f64,
        }
    }
}

/// Fixed-width summary table for terminal output.
pub fn render_table(records: &[RunRecord]) -> String {
    let mut out = String::new();
    let rule = "-".repeat(66);
    let _ = writeln!(
        out,
        "{:<12} {:>8} {:>8} {:>12} {:>10} {:>12}",
        "Method", "Size", "Threads", "Time(s)", "Speedup", "Efficiency"
    );
    let _ = writeln!(out, "{rule}");
    for r in records {
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>8} {:>12.6} {:>10.2} {:>12.2}",
            r.method, r.size, r.threads, r.time, r.speedup, r.efficiency
        );
    }
    out
}

/// CSV rendering with the fixed column set
/// `Method,Size,Threads,Time,Speedup,Efficiency`.
pub fn render_csv(records: &[RunRecord]) -> String {
    let mut out = String::from("Method,Size,Threads,Time,Speedup,Efficiency\n");
    for r in records {
        let _ = writeln!(
            out,
            "{},{},{},{:.6},{:.2},{:.2}",
            r.method, r.size, r.threads, r.time, r.speedup, r.efficiency
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_derives_speedup_and_efficiency() {
        let r = RunRecord::new("Distributed", 500, 4, 0.5, 1.0);
        assert_eq!(r.speedup, 2.0);
        assert_eq!(r.efficiency, 0.5);
    }

    #[test]
    fn test_csv_header_and_rows() {
        let records = vec![
            RunRecord::new("Sequential", 100, 1, 2.0, 2.0),
            RunRecord::new("Threaded", 100, 4, 1.0, 2.0),
        ];
        let csv = render_csv(&records);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Method,Size,Threads,Time,Speedup,Efficiency"));
        assert_eq!(lines.next(), Some("Sequential,100,1,2.000000,1.00,1.00"));
        assert_eq!(lines.next(), Some("Threaded,100,4,1.000000,2.00,0.50"));
    }

    #[test]
    fn test_table_contains_every_method() {
        let records = vec![
            RunRecord::new("Sequential", 10, 1, 1.0, 1.0),
            RunRecord::new("Distributed", 10, 2, 0.6, 1.0),
        ];
        let table = render_table(&records);
        assert!(table.contains("Sequential"));
        assert!(table.contains("Distributed"));
    }
}
