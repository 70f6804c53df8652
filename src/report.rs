//! CSV export of sweep results.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::stats::Efficiency;
use crate::sweep::SweepPoint;

fn rates_of(points: &[SweepPoint]) -> Vec<f64> {
    let mut rates: Vec<f64> = Vec::new();
    for point in points {
        if !rates.contains(&point.arrival_rate) {
            rates.push(point.arrival_rate);
        }
    }
    rates
}

fn node_counts_of(points: &[SweepPoint]) -> Vec<usize> {
    let mut counts: Vec<usize> = Vec::new();
    for point in points {
        if !counts.contains(&point.node_count) {
            counts.push(point.node_count);
        }
    }
    counts
}

fn efficiency_cell(efficiency: Efficiency) -> String {
    match efficiency {
        Efficiency::Ratio(r) => r.to_string(),
        Efficiency::NoAttempts => "NaN".to_string(),
    }
}

/// One row per node count, one column per arrival rate.
fn write_table<W, F>(writer: &mut W, label: &str, points: &[SweepPoint], cell: F) -> Result<()>
where
    W: Write,
    F: Fn(&SweepPoint) -> String,
{
    let rates = rates_of(points);
    write!(writer, "Number of Nodes")?;
    for rate in &rates {
        write!(writer, ", {} ({}pkt/sec)", label, rate)?;
    }
    writeln!(writer)?;

    for nodes in node_counts_of(points) {
        write!(writer, "{}", nodes)?;
        for rate in &rates {
            let value = points
                .iter()
                .find(|p| p.node_count == nodes && p.arrival_rate == *rate)
                .map(&cell)
                .unwrap_or_default();
            write!(writer, ",{}", value)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_efficiency_csv<W: Write>(writer: &mut W, points: &[SweepPoint]) -> Result<()> {
    write_table(writer, "Efficiency", points, |p| efficiency_cell(p.efficiency))
}

pub fn write_throughput_csv<W: Write>(writer: &mut W, points: &[SweepPoint]) -> Result<()> {
    write_table(writer, "Throughput", points, |p| p.throughput.to_string())
}

/// Long format, one line per grid point, including the analytical column.
pub fn write_sweep_csv<W: Write>(writer: &mut W, points: &[SweepPoint]) -> Result<()> {
    writeln!(
        writer,
        "node_count,arrival_rate,efficiency,throughput,theoretical_throughput,attempted,successful,dropped"
    )?;
    for point in points {
        let attempted: usize = point.runs.iter().map(|r| r.attempted).sum();
        let successful: usize = point.runs.iter().map(|r| r.successful).sum();
        let dropped: usize = point.runs.iter().map(|r| r.dropped).sum();
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            point.node_count,
            point.arrival_rate,
            efficiency_cell(point.efficiency),
            point.throughput,
            point.theoretical_throughput,
            attempted,
            successful,
            dropped
        )?;
    }
    Ok(())
}

/// Write `Efficiency_<tag>.csv`, `Throughput_<tag>.csv` and
/// `Sweep_<tag>.csv` into `dir`, creating it if needed.
pub fn write_report_files(dir: &Path, tag: &str, points: &[SweepPoint]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let efficiency_path = dir.join(format!("Efficiency_{}.csv", tag));
    let throughput_path = dir.join(format!("Throughput_{}.csv", tag));
    let sweep_path = dir.join(format!("Sweep_{}.csv", tag));

    let mut writer = BufWriter::new(File::create(&efficiency_path)?);
    write_efficiency_csv(&mut writer, points)?;
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&throughput_path)?);
    write_throughput_csv(&mut writer, points)?;
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&sweep_path)?);
    write_sweep_csv(&mut writer, points)?;
    writer.flush()?;

    let paths = vec![efficiency_path, throughput_path, sweep_path];
    for path in &paths {
        info!("wrote {}", path.display());
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SimResult;

    fn point(node_count: usize, arrival_rate: f64, efficiency: Efficiency, throughput: f64) -> SweepPoint {
        SweepPoint {
            node_count,
            arrival_rate,
            efficiency,
            throughput,
            theoretical_throughput: 100.0,
            runs: vec![SimResult {
                node_count,
                attempted: 10,
                successful: 8,
                dropped: 1,
                events: 9,
                horizon: 1.0,
                frame_length_bits: 1500.0,
            }],
        }
    }

    fn points() -> Vec<SweepPoint> {
        vec![
            point(20, 7.0, Efficiency::Ratio(0.5), 1500.0),
            point(20, 10.0, Efficiency::Ratio(0.25), 3000.0),
            point(40, 7.0, Efficiency::NoAttempts, 0.0),
            point(40, 10.0, Efficiency::Ratio(1.0), 4500.0),
        ]
    }

    #[test]
    fn efficiency_table_layout() {
        let mut out = Vec::new();
        write_efficiency_csv(&mut out, &points()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Number of Nodes, Efficiency (7pkt/sec), Efficiency (10pkt/sec)\n\
             20,0.5,0.25\n\
             40,NaN,1\n"
        );
    }

    #[test]
    fn throughput_table_layout() {
        let mut out = Vec::new();
        write_throughput_csv(&mut out, &points()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Number of Nodes, Throughput (7pkt/sec), Throughput (10pkt/sec)\n\
             20,1500,3000\n\
             40,0,4500\n"
        );
    }

    #[test]
    fn long_format_totals_runs() {
        let mut out = Vec::new();
        write_sweep_csv(&mut out, &points()[..1]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "20,7,0.5,1500,100,10,8,1");
    }

    #[test]
    fn writes_files() {
        let dir = std::env::temp_dir().join(format!("csma_report_{}", std::process::id()));
        let paths = write_report_files(&dir, "test", &points()).unwrap();
        assert_eq!(paths.len(), 3);
        let efficiency = fs::read_to_string(&paths[0]).unwrap();
        assert!(efficiency.starts_with("Number of Nodes, Efficiency (7pkt/sec)"));
        assert!(paths[1].ends_with("Throughput_test.csv"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
