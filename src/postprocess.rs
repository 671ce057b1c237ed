//! Layer-by-layer post-processing
//!
//! Emits every original layer followed by an auxiliary pass over the same
//! layer, bracketed by device on/off commands and dwells:
//!
//! ```text
//! <original layer lines>
//! G1 Z<entry + clearance> F<transition>
//! <on command>
//! G4 P<dwell>
//! <replayed path or grid>
//! <off command>
//! G4 P<dwell>
//! G1 Z<exit> F<transition>
//! ```

use std::path::Path;

use anyhow::Context;
use auxpass_core::{Error, LayerExtent, Offset2D, Point3D, Result, TrackError};
use auxpass_gcode::{
    grid_pass, replay, segment, track_from, write_program, GridPassParameters, LayerSlice, LayerTrack,
    ProgramReader, Projection,
};
use auxpass_settings::{Config, LayerErrorPolicy, PassPattern};

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingReport {
    /// Layers in the program
    pub layers: usize,
    /// Layers that received an auxiliary pass
    pub replayed_layers: usize,
    /// Layers without any recorded move
    pub empty_layers: usize,
    /// Layers left untouched after a tracking error
    pub skipped_layers: usize,
    /// Auxiliary moves emitted across all layers
    pub replayed_moves: usize,
}

/// Output of a run
#[derive(Debug, Clone)]
pub struct ProcessedProgram {
    /// The transformed program
    pub lines: Vec<String>,
    /// What happened to each layer, in aggregate
    pub report: ProcessingReport,
}

/// Drives segmentation, tracking and replay over a whole program
#[derive(Debug, Clone)]
pub struct PostProcessor {
    config: Config,
}

impl PostProcessor {
    /// Create a post-processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn offset(&self) -> Offset2D {
        Offset2D::new(self.config.motion.offset_x, self.config.motion.offset_y)
    }

    fn header_comment() -> String {
        format!(
            ";Post-processed by auxpass {} for auxiliary device control",
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Copy the prologue, inserting the header comment before the first
    /// non-comment line
    fn emit_prologue<S: AsRef<str>>(&self, prologue: &[S], out: &mut Vec<String>) {
        let mut pending = self.config.processing.annotate;
        for line in prologue {
            let text = line.as_ref();
            if pending && !text.trim_start().starts_with(';') {
                out.push(Self::header_comment());
                pending = false;
            }
            out.push(text.to_string());
        }
        if pending {
            out.push(Self::header_comment());
        }
    }

    /// Moves followed by the auxiliary tool over one layer
    fn pass_moves(&self, layer: &LayerTrack) -> Result<Vec<String>> {
        let feed_rate = self.config.motion.feed_rate;
        let moves = match self.config.processing.pattern {
            PassPattern::Path => replay(
                &layer.history,
                feed_rate,
                Projection::PlanarOffset(self.offset()),
            )?,
            PassPattern::Grid => {
                let bbox = layer.bounding_box()?;
                let params = GridPassParameters {
                    stepover: self.config.processing.grid_stepover,
                    overhang: self.config.processing.grid_overhang,
                    offset: self.offset(),
                    feed_rate,
                };
                grid_pass(&bbox, &params)?
            }
        };
        Ok(moves)
    }

    /// Wrap a layer's pass moves with height changes and device control
    fn aux_block(&self, moves: Vec<String>, extent: &LayerExtent) -> Vec<String> {
        let motion = &self.config.motion;
        let aux = &self.config.aux;
        let dwell = format!("G4 P{}", aux.dwell_ms());

        let mut block = Vec::with_capacity(moves.len() + 6);
        block.push(format!(
            "G1 Z{:.3} F{:.1}",
            extent.entry_z + motion.z_clearance,
            motion.transition_feed_rate
        ));
        block.push(aux.on_command.clone());
        block.push(dwell.clone());
        block.extend(moves);
        block.push(aux.off_command.clone());
        block.push(dwell);
        block.push(format!(
            "G1 Z{:.3} F{:.1}",
            extent.exit_z, motion.transition_feed_rate
        ));
        block
    }

    /// Track one layer, applying the configured error policy.
    ///
    /// `Ok(None)` means the layer is kept as printed.
    fn track_layer<S: AsRef<str>>(
        &self,
        layer: &LayerSlice<'_, S>,
        start: Point3D,
        report: &mut ProcessingReport,
    ) -> Result<Option<(LayerTrack, LayerExtent)>> {
        let tracked = match track_from(layer.lines, start, layer.start_line) {
            Ok(tracked) => tracked,
            Err(source) => match self.config.processing.on_layer_error {
                LayerErrorPolicy::Abort => return Err(Error::in_layer(layer.index, source)),
                LayerErrorPolicy::Skip => {
                    tracing::warn!(layer = layer.index, error = %source, "Skipping layer");
                    report.skipped_layers += 1;
                    return Ok(None);
                }
            },
        };

        match tracked.extent() {
            Ok(extent) => Ok(Some((tracked, extent))),
            Err(TrackError::EmptyHistory) => {
                tracing::warn!(
                    layer = layer.index,
                    "Layer has no print moves, no auxiliary pass"
                );
                report.empty_layers += 1;
                Ok(None)
            }
            Err(source) => Err(Error::in_layer(layer.index, source)),
        }
    }

    /// Transform a whole program
    pub fn process<S: AsRef<str>>(&self, lines: &[S]) -> Result<ProcessedProgram> {
        let partition = segment(lines)?;
        let mut report = ProcessingReport {
            layers: partition.layer_count(),
            ..Default::default()
        };

        let mut out = Vec::with_capacity(lines.len() * 2);
        self.emit_prologue(partition.prologue, &mut out);

        // The next layer starts at this layer's exit height, with the XY of
        // its last recorded move
        let mut start = Point3D::at_height(self.config.motion.initial_z);
        for layer in &partition.layers {
            out.extend(layer.lines.iter().map(|l| l.as_ref().to_string()));

            if let Some((tracked, extent)) = self.track_layer(layer, start, &mut report)? {
                let moves = self.pass_moves(&tracked)?;
                tracing::debug!(
                    layer = layer.index,
                    recorded = tracked.history.len(),
                    moves = moves.len(),
                    entry_z = extent.entry_z,
                    exit_z = extent.exit_z,
                    thickness = extent.thickness(),
                    "Auxiliary pass"
                );
                report.replayed_moves += moves.len();
                report.replayed_layers += 1;
                out.extend(self.aux_block(moves, &extent));
                start = Point3D::new(tracked.final_cursor.x, tracked.final_cursor.y, extent.exit_z);
            }

            out.extend(layer.trailing.iter().map(|l| l.as_ref().to_string()));
        }

        out.extend(partition.epilogue.iter().map(|l| l.as_ref().to_string()));

        tracing::info!(
            layers = report.layers,
            replayed = report.replayed_layers,
            empty = report.empty_layers,
            skipped = report.skipped_layers,
            moves = report.replayed_moves,
            "Post-processing complete"
        );

        Ok(ProcessedProgram { lines: out, report })
    }

    /// Read `input`, transform it and write the result to `output`
    pub fn process_file(&self, input: &Path, output: &Path) -> anyhow::Result<ProcessingReport> {
        let reader = ProgramReader::new(input)?;
        let (lines, stats) = reader.read_lines()?;
        tracing::info!(
            input = %input.display(),
            lines = stats.lines_read,
            bytes = stats.file_size,
            "Read program"
        );

        let processed = self
            .process(&lines)
            .with_context(|| format!("Failed to process {}", input.display()))?;
        write_program(output, &processed.lines)?;
        tracing::info!(
            output = %output.display(),
            lines = processed.lines.len(),
            "Wrote program"
        );

        Ok(processed.report)
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.processing.annotate = false;
        config
    }

    #[test]
    fn test_header_inserted_after_leading_comments() {
        let processor = PostProcessor::default();
        let mut out = Vec::new();
        processor.emit_prologue(&[";FLAVOR:Marlin", ";TIME:60", "M104 S200"], &mut out);
        assert_eq!(out.len(), 4);
        assert!(out[2].starts_with(";Post-processed by auxpass"));
        assert_eq!(out[3], "M104 S200");
    }

    #[test]
    fn test_header_appended_to_comment_only_prologue() {
        let processor = PostProcessor::default();
        let mut out = Vec::new();
        processor.emit_prologue(&[";FLAVOR:Marlin"], &mut out);
        assert_eq!(out.len(), 2);
        assert!(out[1].starts_with(";Post-processed"));
    }

    #[test]
    fn test_no_header_when_disabled() {
        let processor = PostProcessor::new(quiet_config());
        let mut out = Vec::new();
        processor.emit_prologue(&[";FLAVOR:Marlin", "G28"], &mut out);
        assert_eq!(out, vec![";FLAVOR:Marlin", "G28"]);
    }

    #[test]
    fn test_aux_block_layout() {
        let processor = PostProcessor::new(quiet_config());
        let layer = auxpass_gcode::track(&["G1 X0 Y0 Z0.2 E1", "G1 X10 Y0 E2"], 0.0, 0).unwrap();
        let extent = layer.extent().unwrap();
        let moves = processor.pass_moves(&layer).unwrap();
        let block = processor.aux_block(moves, &extent);
        assert_eq!(
            block,
            vec![
                "G1 Z0.207 F2000.0",
                "SET_PIN PIN=caselight1 VALUE=1",
                "G4 P2000",
                "G1 X10.000 Y10.000 F200.0",
                "G1 X20.000 Y10.000 F200.0",
                "SET_PIN PIN=caselight1 VALUE=0",
                "G4 P2000",
                "G1 Z0.200 F2000.0",
            ]
        );
    }
}
