//! Core processing engine
//!
//! Streams every input source row by row through the [`RowFilter`] and
//! writes kept rows. Sources are read strictly in order, one at a time.

use crate::cli::Args;
use crate::encoding::InputEncoding;
use crate::error::Result;
use crate::filter::{FilterOptions, RowFilter};
use crate::input::{CsvFormat, InputSource};
use crate::key::KeyColumns;
use crate::output::{OutputFormat, OutputTarget, RowWriter};
use crate::pattern::{MatchMode, PatternSet, PatternSetBuilder};
use crate::progress::{create_spinner, RunStats};

use colored::*;
use csv::StringRecord;
use indicatif::ProgressBar;
use std::io::{Read, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;

/// Rows between spinner updates
const PROGRESS_INTERVAL: u64 = 4096;

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub inputs: Vec<InputSource>,
    pub output: OutputTarget,
    pub input_format: CsvFormat,
    pub output_format: OutputFormat,
    pub pattern: Option<String>,
    pub pattern_file: Option<PathBuf>,
    pub pattern_key: KeyColumns,
    pub key: KeyColumns,
    pub mode: MatchMode,
    pub speedup: bool,
    pub invert: bool,
    pub ignore_title: bool,
    pub encoding: InputEncoding,
    pub buffer_size: usize,
    pub progress: bool,
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let input_format = args.input_format()?;

        Ok(Self {
            inputs: InputSource::from_paths(&args.input),
            output: args.output_target(),
            output_format: args.output_format(&input_format)?,
            input_format,
            pattern: args.pattern.clone(),
            pattern_file: args.pattern_file.clone(),
            pattern_key: args.pattern_key.parse()?,
            key: args.key.parse()?,
            mode: if args.regexp {
                MatchMode::Regex
            } else {
                MatchMode::Literal
            },
            speedup: args.speedup,
            invert: args.invert,
            ignore_title: args.ignore_title,
            encoding: InputEncoding::from_label(&args.encoding)?,
            buffer_size: args.parse_buffer_size()?,
            progress: args.progress,
        })
    }

    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            key_columns: self.key.clone(),
            speedup: self.speedup,
            invert: self.invert,
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            inputs: vec![InputSource::Stdin],
            output: OutputTarget::Stdout,
            input_format: CsvFormat::default(),
            output_format: OutputFormat::default(),
            pattern: None,
            pattern_file: None,
            pattern_key: KeyColumns::default(),
            key: KeyColumns::default(),
            mode: MatchMode::Literal,
            speedup: false,
            invert: false,
            ignore_title: false,
            encoding: InputEncoding::Auto,
            buffer_size: crate::output::DEFAULT_BUFFER_SIZE,
            progress: false,
        }
    }
}

/// Build the pattern set from the literal pattern and the pattern file
pub fn load_patterns(config: &ProcessorConfig) -> Result<PatternSet> {
    let mut builder = PatternSetBuilder::new();

    if let Some(ref pattern) = config.pattern {
        builder.add_literal(pattern);
    }
    if let Some(ref path) = config.pattern_file {
        builder.add_file(path, &config.input_format, &config.pattern_key, config.encoding)?;
    }

    let patterns = builder.build(config.mode)?;
    log::info!("load {} patterns", patterns.len());

    Ok(patterns)
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
    filter: RowFilter,
    stats: RunStats,
    progress: ProgressBar,
}

impl Processor {
    /// Load the patterns and set up the filter
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        let patterns = load_patterns(&config)?;
        Ok(Self::with_patterns(config, patterns))
    }

    /// Use an already built pattern set
    pub fn with_patterns(config: ProcessorConfig, patterns: PatternSet) -> Self {
        let filter = RowFilter::new(patterns, config.filter_options());
        let progress = if config.progress {
            create_spinner("Filtering...")
        } else {
            ProgressBar::hidden()
        };

        Self {
            config,
            filter,
            stats: RunStats::new(),
            progress,
        }
    }

    /// Run over all configured inputs, writing to the configured output
    pub fn process(&mut self) -> Result<&RunStats> {
        let mut writer = RowWriter::create(
            &self.config.output,
            &self.config.output_format,
            self.config.buffer_size,
        )?;

        let inputs = self.config.inputs.clone();
        self.process_sources(&inputs, &mut writer)?;
        writer.flush()?;

        Ok(&self.stats)
    }

    /// Run over `inputs`, cutting each one short once speedup has used up every pattern
    pub fn process_sources<W: Write>(&mut self, inputs: &[InputSource], writer: &mut RowWriter<W>) -> Result<()> {
        for source in inputs {
            let reader = source.open(self.config.encoding)?;
            self.stats.add_source();

            if self.process_reader(reader, writer)?.is_break() {
                log::info!("all patterns consumed, stop reading {}", source);
            }
        }

        self.progress.set_position(self.stats.seen);
        self.progress.finish_with_message("Complete".green().to_string());
        Ok(())
    }

    /// Filter one source
    ///
    /// Blank lines are rows without fields: counted, never written. Returns
    /// `Break` when the source was left unfinished because no pattern is
    /// left to match. The row that triggers the stop is counted as seen,
    /// the ones after it are not read.
    pub fn process_reader<R: Read, W: Write>(
        &mut self,
        reader: R,
        writer: &mut RowWriter<W>,
    ) -> Result<ControlFlow<()>> {
        let mut rows = self.config.input_format.rows(reader);
        let mut record = StringRecord::new();

        if self.config.ignore_title && rows.read_row(&mut record)? {
            log::debug!("title skipped: {:?}", record);
        }

        while rows.read_row(&mut record)? {
            if self.filter.is_exhausted() {
                self.stats.add_row(false);
                return Ok(ControlFlow::Break(()));
            }

            let keep = self.filter.check(&record)?;
            self.stats.add_row(keep);
            if keep {
                writer.write_row(&record)?;
            }

            if self.stats.seen % PROGRESS_INTERVAL == 0 {
                self.progress.set_position(self.stats.seen);
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Get processing statistics
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn filter(&self) -> &RowFilter {
        &self.filter
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn literal(keys: &[&str]) -> PatternSet {
        let mut builder = PatternSetBuilder::new();
        for key in keys {
            builder.add(key.to_string());
        }
        builder.build(MatchMode::Literal).unwrap()
    }

    fn run(processor: &mut Processor, data: &str) -> (String, ControlFlow<()>) {
        let mut writer = RowWriter::new(Vec::new(), &OutputFormat::default());
        let flow = processor.process_reader(data.as_bytes(), &mut writer).unwrap();
        (String::from_utf8(writer.into_inner().unwrap()).unwrap(), flow)
    }

    fn temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_keeps_matching_rows() {
        let mut processor = Processor::with_patterns(ProcessorConfig::default(), literal(&["a", "c"]));
        let (out, flow) = run(&mut processor, "a,1\nb,2\nc,3\nd,4\n");

        assert_eq!(out, "a,1\nc,3\n");
        assert!(flow.is_continue());
        assert_eq!(processor.stats().seen, 4);
        assert_eq!(processor.stats().kept, 2);
        assert_eq!(processor.stats().summary_line(), "hit proportion: 50.00% ( 2 / 4 )");
    }

    #[test]
    fn test_ignore_title_not_counted() {
        let config = ProcessorConfig {
            ignore_title: true,
            invert: true,
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["a"]));
        let (out, _) = run(&mut processor, "id,value\na,1\nb,2\n");

        assert_eq!(out, "b,2\n");
        assert_eq!(processor.stats().seen, 2);
    }

    #[test]
    fn test_speedup_stops_early() {
        let config = ProcessorConfig {
            speedup: true,
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["A", "B"]));
        let (out, flow) = run(&mut processor, "A,1\nA,2\nB,3\nA,4\nC,5\n");

        assert_eq!(out, "A,1\nB,3\n");
        assert!(flow.is_break());
        // the row that finds the set empty is seen, C,5 is not
        assert_eq!(processor.stats().seen, 4);
        assert_eq!(processor.stats().summary_line(), "hit proportion: 50.00% ( 2 / 4 )");
        assert!(processor.filter().patterns().is_empty());
    }

    #[test]
    fn test_speedup_counts_stop_row() {
        let config = ProcessorConfig {
            speedup: true,
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["A"]));
        let (out, flow) = run(&mut processor, "A,1\nA,2\nB,3\nA,4\nC,5\n");

        assert_eq!(out, "A,1\n");
        assert!(flow.is_break());
        assert_eq!(processor.stats().summary_line(), "hit proportion: 50.00% ( 1 / 2 )");
    }

    #[test]
    fn test_blank_lines_counted_and_dropped() {
        let mut processor = Processor::with_patterns(ProcessorConfig::default(), literal(&["a"]));
        let (out, _) = run(&mut processor, "a,1\n\nb,2\n");

        assert_eq!(out, "a,1\n");
        assert_eq!(processor.stats().summary_line(), "hit proportion: 33.33% ( 1 / 3 )");
    }

    #[test]
    fn test_blank_lines_dropped_when_inverted() {
        let config = ProcessorConfig {
            invert: true,
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["a"]));
        let (out, _) = run(&mut processor, "a,1\n\nb,2\n");

        assert_eq!(out, "b,2\n");
        assert_eq!(processor.stats().summary_line(), "hit proportion: 33.33% ( 1 / 3 )");
    }

    #[test]
    fn test_blank_first_line_is_title() {
        let config = ProcessorConfig {
            ignore_title: true,
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["a"]));
        let (out, _) = run(&mut processor, "\nid,v\na,1\n\"x\ny\",2\n\n");

        assert_eq!(out, "a,1\n");
        // id,v, a,1, the multi-line row and the trailing blank line
        assert_eq!(processor.stats().seen, 4);
        assert_eq!(processor.stats().kept, 1);
    }

    #[test]
    fn test_column_overrun_aborts() {
        let config = ProcessorConfig {
            key: "3".parse().unwrap(),
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["x"]));
        let mut writer = RowWriter::new(Vec::new(), &OutputFormat::default());

        let err = processor
            .process_reader("a,b,x\nc,d\n".as_bytes(), &mut writer)
            .unwrap_err();
        assert_eq!(err.to_string(), "key (3) is beyond number of column (2)");
    }

    #[test]
    fn test_empty_input_zero_proportion() {
        let mut processor = Processor::with_patterns(ProcessorConfig::default(), literal(&["a"]));
        let (out, _) = run(&mut processor, "");

        assert!(out.is_empty());
        assert_eq!(processor.stats().hit_proportion(), 0.0);
        assert_eq!(processor.stats().summary_line(), "hit proportion: 0.00% ( 0 / 0 )");
    }

    #[test]
    fn test_multiple_files_share_speedup_state() {
        let first = temp_csv("id\nA\nB\n");
        let second = temp_csv("id\nA\nC\n");
        let third = temp_csv("id\nC\n");

        let config = ProcessorConfig {
            speedup: true,
            ignore_title: true,
            ..Default::default()
        };
        let mut processor = Processor::with_patterns(config, literal(&["A", "C"]));
        let inputs = vec![
            InputSource::File(first.path().to_path_buf()),
            InputSource::File(second.path().to_path_buf()),
            InputSource::File(third.path().to_path_buf()),
        ];

        let mut writer = RowWriter::new(Vec::new(), &OutputFormat::default());
        processor.process_sources(&inputs, &mut writer).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(out, "A\nC\n");
        // the third file still has its title skipped and one row counted
        assert_eq!(processor.stats().sources, 3);
        assert_eq!(processor.stats().seen, 5);
    }

    #[test]
    fn test_end_to_end_with_pattern_file() {
        let patterns = temp_csv("x,k1,1\ny,k2,2\nz,k3,3\n");
        let data = temp_csv("k1,x\nk9,y\nk3,z\n");
        let temp_dir = TempDir::new().unwrap();
        let out_path = temp_dir.path().join("out.csv");

        let config = ProcessorConfig {
            inputs: vec![InputSource::File(data.path().to_path_buf())],
            output: OutputTarget::File(out_path.clone()),
            pattern_file: Some(patterns.path().to_path_buf()),
            pattern_key: "2".parse().unwrap(),
            ..Default::default()
        };

        let mut processor = Processor::new(config).unwrap();
        let stats = processor.process().unwrap();
        assert_eq!(stats.seen, 3);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.summary_line(), "hit proportion: 66.67% ( 2 / 3 )");

        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "k1,x\nk3,z\n");
    }

    #[test]
    fn test_no_pattern_fails() {
        let err = Processor::new(ProcessorConfig::default()).err().unwrap();
        assert!(err.to_string().starts_with("no pattern given"));
    }
}
