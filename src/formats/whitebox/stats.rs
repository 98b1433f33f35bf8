//! Statistics sidecar (`.wstat`) and the streaming accumulators behind it
//!
//! Statistics take two passes over the grid. The first ([`RangeAccumulator`])
//! counts valid cells and finds the value range, which fixes the histogram
//! bins; the second ([`HistogramAccumulator`]) fills the histogram and the
//! squared deviations.

use std::cell::OnceCell;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::DataType;

/// Histogram of valid cell values
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bin_width: f64,
    pub counts: Vec<u64>,
}

/// Summary statistics of the valid cells of a raster
#[derive(Debug, Clone)]
pub struct RasterStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub num_valid_cells: u64,
    pub histogram: Histogram,
    cumulative: OnceCell<Vec<f64>>,
}

impl RasterStats {
    /// Value below which `percentile` percent of the valid cells fall.
    ///
    /// Finds the first histogram bin whose cumulative fraction reaches the
    /// requested one and interpolates linearly across the width ending at
    /// that bin's start, so percentile 100 is exactly the maximum. Returns
    /// `None` when the raster has no valid cells.
    pub fn percentile(&self, percentile: f64) -> Option<f64> {
        if self.num_valid_cells == 0 || self.histogram.counts.is_empty() {
            return None;
        }

        let fraction = (percentile / 100.0).clamp(0.0, 1.0);
        let cumulative = self.cumulative();
        let width = self.histogram.bin_width;

        let bin = cumulative
            .iter()
            .position(|&c| c >= fraction)
            .unwrap_or(cumulative.len() - 1);
        let y1 = if bin == 0 { 0.0 } else { cumulative[bin - 1] };
        let y2 = cumulative[bin];
        let x1 = self.min + (bin as f64 - 1.0) * width;

        if y2 <= y1 {
            return Some(x1);
        }
        Some(x1 + (fraction - y1) / (y2 - y1) * width)
    }

    /// Cumulative histogram normalized by the valid cell count
    pub fn cumulative(&self) -> &[f64] {
        self.cumulative.get_or_init(|| {
            let total = self.num_valid_cells as f64;
            let mut running = 0u64;
            self.histogram
                .counts
                .iter()
                .map(|&count| {
                    running += count;
                    running as f64 / total
                })
                .collect()
        })
    }

    /// Reads a stats sidecar
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Writes a stats sidecar, replacing any previous content
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "START_STATS:");
        let _ = writeln!(text, "MIN: \t{:?}", self.min);
        let _ = writeln!(text, "MAX: \t{:?}", self.max);
        let _ = writeln!(text, "MEAN: \t{:?}", self.mean);
        let _ = writeln!(text, "MEDIAN: \t{:?}", self.median);
        let _ = writeln!(text, "MODE: \t{:?}", self.mode);
        let _ = writeln!(text, "STD_DEV: \t{:?}", self.std_dev);
        let _ = writeln!(text, "NUM_VALID_CELLS: \t{}", self.num_valid_cells);
        let _ = writeln!(text, "END_STATS");
        let _ = writeln!(text, "START_HISTO");
        let _ = writeln!(text, "BIN_WIDTH: \t{:?}", self.histogram.bin_width);
        let _ = writeln!(text, "NUM_BINS: \t{}", self.histogram.counts.len());
        for count in &self.histogram.counts {
            let _ = writeln!(text, "{}", count);
        }
        let _ = writeln!(text, "END_HISTO");
        text
    }

    pub fn parse(text: &str) -> Result<Self> {
        #[derive(PartialEq)]
        enum Block {
            None,
            Stats,
            Histo,
        }

        let mut block = Block::None;
        let mut min = None;
        let mut max = None;
        let mut mean = None;
        let mut median = None;
        let mut mode = None;
        let mut std_dev = None;
        let mut num_valid_cells = None;
        let mut bin_width = None;
        let mut num_bins = None;
        let mut counts = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (label, value) = line.split_once(':').unwrap_or((line, ""));
            let label = label.trim().to_ascii_uppercase();
            let value = value.trim();

            match label.as_str() {
                "START_STATS" => block = Block::Stats,
                "START_HISTO" => block = Block::Histo,
                "END_STATS" | "END_HISTO" => block = Block::None,
                "MIN" if block == Block::Stats => min = Some(parse_value(&label, value)?),
                "MAX" if block == Block::Stats => max = Some(parse_value(&label, value)?),
                "MEAN" if block == Block::Stats => mean = Some(parse_value(&label, value)?),
                "MEDIAN" if block == Block::Stats => median = Some(parse_value(&label, value)?),
                "MODE" if block == Block::Stats => mode = Some(parse_value(&label, value)?),
                "STD_DEV" if block == Block::Stats => std_dev = Some(parse_value(&label, value)?),
                "NUM_VALID_CELLS" if block == Block::Stats => {
                    num_valid_cells = Some(parse_value::<u64>(&label, value)?)
                }
                "BIN_WIDTH" if block == Block::Histo => bin_width = Some(parse_value(&label, value)?),
                "NUM_BINS" if block == Block::Histo => num_bins = Some(parse_value::<usize>(&label, value)?),
                _ if block == Block::Histo => counts.push(parse_value::<u64>("histogram count", line)?),
                _ => log::debug!("Ignoring stats line '{}'", line),
            }
        }

        let num_bins = require(num_bins, "NUM_BINS")?;
        if counts.len() != num_bins {
            return Err(Error::CorruptStats(format!(
                "expected {} histogram bins, found {}",
                num_bins,
                counts.len()
            )));
        }

        Ok(Self {
            min: require(min, "MIN")?,
            max: require(max, "MAX")?,
            mean: require(mean, "MEAN")?,
            median: require(median, "MEDIAN")?,
            mode: require(mode, "MODE")?,
            std_dev: require(std_dev, "STD_DEV")?,
            num_valid_cells: require(num_valid_cells, "NUM_VALID_CELLS")?,
            histogram: Histogram {
                bin_width: require(bin_width, "BIN_WIDTH")?,
                counts,
            },
            cumulative: OnceCell::new(),
        })
    }
}

fn parse_value<T: std::str::FromStr>(label: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::CorruptStats(format!("invalid value '{}' for {}", value, label)))
}

fn require<T>(value: Option<T>, label: &str) -> Result<T> {
    value.ok_or_else(|| Error::CorruptStats(format!("missing {}", label)))
}

/// First pass: valid cell count, sum and value range
#[derive(Debug, Clone)]
pub struct RangeAccumulator {
    no_data: f64,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl RangeAccumulator {
    pub fn new(no_data: f64) -> Self {
        Self {
            no_data,
            count: 0,
            sum: 0.0,
            min: f64::MAX,
            max: -f64::MAX,
        }
    }

    pub fn add_row(&mut self, values: &[f64]) {
        for &z in values.iter().filter(|&&z| z != self.no_data) {
            self.count += 1;
            self.sum += z;
            self.min = self.min.min(z);
            self.max = self.max.max(z);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest valid value, or `f64::MAX` when there is none
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest valid value, or `-f64::MAX` when there is none
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            self.no_data
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Second pass: histogram and squared deviations from the mean
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    range: RangeAccumulator,
    integral: bool,
    mean: f64,
    bin_width: f64,
    counts: Vec<u64>,
    squared_deviations: f64,
}

impl HistogramAccumulator {
    /// Sizes the histogram from a completed first pass.
    ///
    /// Integer and byte rasters get one bin per value. Floating point
    /// rasters get 1024, 2048, 4096 or 8196 bins depending on the range.
    pub fn new(range: RangeAccumulator, data_type: DataType) -> Self {
        let integral = data_type.is_integral();
        let (bins, bin_width) = if range.count == 0 {
            (0, 1.0)
        } else if integral {
            ((range.max - range.min) as usize + 1, 1.0)
        } else {
            let spread = range.max - range.min;
            let bins = if spread < 1024.0 {
                1024
            } else if spread < 2048.0 {
                2048
            } else if spread < 4096.0 {
                4096
            } else {
                8196
            };
            let width = if spread > 0.0 {
                spread / (bins - 1) as f64
            } else {
                1.0
            };
            (bins, width)
        };

        Self {
            mean: range.mean(),
            range,
            integral,
            bin_width,
            counts: vec![0; bins],
            squared_deviations: 0.0,
        }
    }

    pub fn add_row(&mut self, values: &[f64]) {
        let no_data = self.range.no_data;
        let last = self.counts.len().saturating_sub(1);
        for &z in values.iter().filter(|&&z| z != no_data) {
            self.squared_deviations += (z - self.mean) * (z - self.mean);
            let bin = (((z - self.range.min) / self.bin_width).floor().max(0.0) as usize).min(last);
            if let Some(count) = self.counts.get_mut(bin) {
                *count += 1;
            }
        }
    }

    pub fn finish(self) -> RasterStats {
        let no_data = self.range.no_data;
        let count = self.range.count;

        let mode = self
            .counts
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, u64)>, (bin, &c)| match best {
                Some((_, best_count)) if best_count >= c => best,
                _ => Some((bin, c)),
            })
            .map(|(bin, _)| {
                if self.integral {
                    self.range.min + bin as f64
                } else {
                    self.range.min + (bin as f64 + 0.5) * self.bin_width
                }
            })
            .unwrap_or(no_data);

        let mut stats = RasterStats {
            min: if count == 0 { no_data } else { self.range.min },
            max: if count == 0 { no_data } else { self.range.max },
            mean: self.mean,
            median: no_data,
            mode,
            std_dev: if count == 0 {
                no_data
            } else {
                (self.squared_deviations / count as f64).sqrt()
            },
            num_valid_cells: count,
            histogram: Histogram {
                bin_width: self.bin_width,
                counts: self.counts,
            },
            cumulative: OnceCell::new(),
        };
        stats.median = stats.percentile(50.0).unwrap_or(no_data);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NO_DATA: f64 = -32768.0;

    fn stats_of(rows: &[&[f64]], data_type: DataType) -> RasterStats {
        let mut range = RangeAccumulator::new(NO_DATA);
        for row in rows {
            range.add_row(row);
        }
        let mut histo = HistogramAccumulator::new(range, data_type);
        for row in rows {
            histo.add_row(row);
        }
        histo.finish()
    }

    #[test]
    fn test_integer_stats() {
        let stats = stats_of(
            &[&[1.0, 2.0, 2.0], &[3.0, NO_DATA, 4.0]],
            DataType::Integer,
        );
        assert_eq!(stats.num_valid_cells, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.mean, 2.4);
        assert_eq!(stats.histogram.counts, vec![1, 2, 1, 1]);
        assert_eq!(stats.histogram.bin_width, 1.0);
        assert_eq!(stats.mode, 2.0);
        // population: deviations 1.96 + 0.16*2 + 0.36 + 2.56 = 5.2
        assert_relative_eq!(stats.std_dev, (5.2f64 / 5.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_float_bin_count_scales_with_range() {
        let small = stats_of(&[&[0.0, 10.0]], DataType::Float);
        assert_eq!(small.histogram.counts.len(), 1024);
        assert_relative_eq!(small.histogram.bin_width, 10.0 / 1023.0);

        let large = stats_of(&[&[0.0, 5000.0]], DataType::Double);
        assert_eq!(large.histogram.counts.len(), 8196);
        assert_eq!(large.histogram.counts.iter().sum::<u64>(), 2);
        assert_eq!(large.histogram.counts[0], 1);
    }

    #[test]
    fn test_constant_raster() {
        let stats = stats_of(&[&[7.5, 7.5], &[7.5, 7.5]], DataType::Double);
        assert_eq!(stats.histogram.counts[0], 4);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.percentile(50.0), Some(7.0));
        assert_eq!(stats.percentile(100.0), Some(7.5));
    }

    #[test]
    fn test_no_valid_cells() {
        let stats = stats_of(&[&[NO_DATA, NO_DATA]], DataType::Float);
        assert_eq!(stats.num_valid_cells, 0);
        assert!(stats.histogram.counts.is_empty());
        assert_eq!(stats.median, NO_DATA);
        assert_eq!(stats.mode, NO_DATA);
        assert_eq!(stats.percentile(50.0), None);
    }

    #[test]
    fn test_percentile_interpolates_within_bin() {
        // counts [1, 2, 1]: cumulative [0.25, 0.75, 1.0]
        let stats = stats_of(&[&[10.0, 11.0, 11.0, 12.0]], DataType::Integer);
        assert_eq!(stats.cumulative(), &[0.25, 0.75, 1.0]);
        assert_relative_eq!(stats.percentile(50.0).unwrap(), 10.5);
        assert_relative_eq!(stats.percentile(25.0).unwrap(), 10.0);
        assert_relative_eq!(stats.percentile(10.0).unwrap(), 9.4);
        assert_relative_eq!(stats.median, 10.5);
    }

    #[test]
    fn test_top_percentile_is_maximum() {
        let integer = stats_of(&[&[1.0, 2.0, 3.0, 4.0]], DataType::Integer);
        assert_eq!(integer.percentile(100.0), Some(4.0));
        assert_eq!(integer.median, 2.0);

        let double = stats_of(&[&[0.0, 5.0, 10.0]], DataType::Double);
        assert_relative_eq!(double.percentile(100.0).unwrap(), 10.0, epsilon = 1e-9);
        for p in 0..=100 {
            assert!(double.percentile(p as f64).unwrap() <= double.max + 1e-9);
        }
    }

    #[test]
    fn test_percentile_is_monotonic() {
        let values: Vec<f64> = (0..500).map(|i| (i as f64 * 0.731).sin() * 100.0 + i as f64).collect();
        let stats = stats_of(&[&values], DataType::Double);

        let mut previous = f64::MIN;
        for p in 0..=100 {
            let value = stats.percentile(p as f64).unwrap();
            assert!(value >= previous, "percentile {} went backwards", p);
            previous = value;
        }
    }

    #[test]
    fn test_sidecar_text_round_trip() {
        let stats = stats_of(&[&[1.0, 2.0, 2.0, 9.0]], DataType::Byte);
        let parsed = RasterStats::parse(&stats.to_text()).unwrap();

        assert_eq!(parsed.min, stats.min);
        assert_eq!(parsed.max, stats.max);
        assert_eq!(parsed.mean, stats.mean);
        assert_eq!(parsed.median, stats.median);
        assert_eq!(parsed.mode, stats.mode);
        assert_eq!(parsed.std_dev, stats.std_dev);
        assert_eq!(parsed.num_valid_cells, 4);
        assert_eq!(parsed.histogram, stats.histogram);
    }

    #[test]
    fn test_sidecar_format() {
        let stats = stats_of(&[&[1.0, 2.0]], DataType::Integer);
        let text = stats.to_text();
        assert!(text.starts_with("START_STATS:\nMIN: \t1.0\n"));
        assert!(text.contains("NUM_VALID_CELLS: \t2\nEND_STATS\nSTART_HISTO\n"));
        assert!(text.ends_with("NUM_BINS: \t2\n1\n1\nEND_HISTO\n"));
    }

    #[test]
    fn test_parse_rejects_truncated_histogram() {
        let stats = stats_of(&[&[1.0, 2.0, 3.0]], DataType::Integer);
        let text = stats.to_text().replace("1\n1\n1\nEND_HISTO", "1\n1\nEND_HISTO");
        assert!(matches!(RasterStats::parse(&text), Err(Error::CorruptStats(_))));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let stats = stats_of(&[&[1.0, 2.0]], DataType::Integer);
        let text = stats.to_text().replace("MEAN: \t1.5\n", "");
        assert!(matches!(RasterStats::parse(&text), Err(Error::CorruptStats(msg)) if msg.contains("MEAN")));
    }
}
