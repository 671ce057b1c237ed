//! Layer segmentation
//!
//! Splits a slicer program into prologue, per-layer slices and epilogue
//! using the structural comments the slicer writes:
//!
//! ```text
//! ;LAYER_COUNT:120      total number of layers, once
//! ;LAYER:0              start of layer 0
//! ;TIME_ELAPSED:12.34   end of the most recently started layer
//! ```
//!
//! Matching is case-insensitive. Layer indices must be dense from zero up to
//! the declared count and appear in ascending order.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use auxpass_core::{error::MissingMarker, SegmentError};

/// A structural annotation recognised in a program line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation<'a> {
    /// `;LAYER_COUNT:<n>` with its raw value text
    LayerCount(&'a str),
    /// `;LAYER:<n>` with its raw index text
    LayerStart(&'a str),
    /// `;TIME_ELAPSED:<t>`
    LayerEnd,
}

impl<'a> Annotation<'a> {
    /// Recognise an annotation, `None` for any other line
    pub fn parse(line: &'a str) -> Option<Self> {
        static ANNOTATION_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ANNOTATION_REGEX.get_or_init(|| {
            Regex::new(r"(?i)^\s*;\s*(layer_count|layer|time_elapsed)\s*:\s*(.*?)\s*$")
                .expect("invalid regex pattern")
        });

        let caps = regex.captures(line)?;
        let value = caps.get(2).map_or("", |m| m.as_str());
        match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
            "layer_count" => Some(Self::LayerCount(value)),
            "layer" => Some(Self::LayerStart(value)),
            _ => Some(Self::LayerEnd),
        }
    }
}

fn parse_index(text: &str, line_number: usize) -> Result<usize, SegmentError> {
    text.parse::<usize>()
        .map_err(|_| SegmentError::MalformedIndex {
            line_number,
            text: text.to_string(),
        })
}

/// One layer of the program
#[derive(Debug, PartialEq)]
pub struct LayerSlice<'a, S> {
    /// Zero-based layer index
    pub index: usize,
    /// Position of the start marker in the program (0-based)
    pub start_line: usize,
    /// Position of the end marker in the program (0-based, inclusive)
    pub end_line: usize,
    /// Lines from the start marker through the end marker
    pub lines: &'a [S],
    /// Lines after the end marker and before the next layer starts
    pub trailing: &'a [S],
}

impl<'a, S> LayerSlice<'a, S> {
    /// Number of lines in the layer, markers included
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Never true for a slice built by `segment`, the markers are included
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A program split into prologue, layers and epilogue
#[derive(Debug, PartialEq)]
pub struct LayerPartition<'a, S> {
    /// Lines before layer 0 starts
    pub prologue: &'a [S],
    /// Layers in index order
    pub layers: Vec<LayerSlice<'a, S>>,
    /// Lines after the last layer ends
    pub epilogue: &'a [S],
}

impl<'a, S> LayerPartition<'a, S> {
    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Every line of the partition in program order
    pub fn lines(&self) -> impl Iterator<Item = &'a S> + '_ {
        self.prologue
            .iter()
            .chain(
                self.layers
                    .iter()
                    .flat_map(|layer| layer.lines.iter().chain(layer.trailing.iter())),
            )
            .chain(self.epilogue.iter())
    }
}

impl<'a, S: AsRef<str>> LayerPartition<'a, S> {
    /// Rebuild the original program as owned lines
    pub fn reassemble(&self) -> Vec<String> {
        self.lines().map(|l| l.as_ref().to_string()).collect()
    }
}

/// Split a program into prologue, layers and epilogue in one pass
pub fn segment<S: AsRef<str>>(lines: &[S]) -> Result<LayerPartition<'_, S>, SegmentError> {
    let mut layer_count: Option<(usize, usize)> = None;
    let mut starts: BTreeMap<usize, usize> = BTreeMap::new();
    let mut ends: BTreeMap<usize, usize> = BTreeMap::new();
    let mut open: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let line_number = i + 1;
        match Annotation::parse(line.as_ref()) {
            Some(Annotation::LayerCount(text)) => {
                if let Some((_, first)) = layer_count {
                    return Err(SegmentError::DuplicateMarker {
                        marker: "layer count declaration".to_string(),
                        first_line: first + 1,
                        line_number,
                    });
                }
                layer_count = Some((parse_index(text, line_number)?, i));
            }
            Some(Annotation::LayerStart(text)) => {
                let layer = parse_index(text, line_number)?;
                if let Some(first) = starts.insert(layer, i) {
                    return Err(SegmentError::DuplicateMarker {
                        marker: format!("start marker for layer {}", layer),
                        first_line: first + 1,
                        line_number,
                    });
                }
                open = Some(layer);
            }
            Some(Annotation::LayerEnd) => {
                let layer = open.ok_or(SegmentError::OrphanLayerEnd { line_number })?;
                if let Some(previous) = ends.insert(layer, i) {
                    tracing::debug!(
                        layer,
                        previous = previous + 1,
                        line = line_number,
                        "Repeated layer end marker, extending layer"
                    );
                }
            }
            None => {}
        }
    }

    let (count, _) = layer_count.ok_or(SegmentError::missing(MissingMarker::LayerCount))?;

    if let Some((&layer, &line)) = starts.range(count..).next() {
        return Err(SegmentError::missing(MissingMarker::Undeclared {
            layer,
            layer_count: count,
            line_number: line + 1,
        }));
    }

    let mut bounds = Vec::with_capacity(count);
    for layer in 0..count {
        let start = *starts
            .get(&layer)
            .ok_or(SegmentError::missing(MissingMarker::LayerStart { layer }))?;
        let end = *ends
            .get(&layer)
            .ok_or(SegmentError::missing(MissingMarker::LayerEnd { layer }))?;
        if let Some(&(_, previous_end)) = bounds.last() {
            if start <= previous_end {
                return Err(SegmentError::OutOfOrder {
                    layer,
                    line_number: start + 1,
                });
            }
        }
        bounds.push((start, end));
    }

    let prologue_end = bounds.first().map_or(lines.len(), |&(start, _)| start);
    let epilogue_start = bounds.last().map_or(lines.len(), |&(_, end)| end + 1);

    let layers = bounds
        .iter()
        .enumerate()
        .map(|(index, &(start, end))| {
            let next_start = bounds.get(index + 1).map_or(end + 1, |&(s, _)| s);
            LayerSlice {
                index,
                start_line: start,
                end_line: end,
                lines: &lines[start..=end],
                trailing: &lines[end + 1..next_start],
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        layers = layers.len(),
        prologue = prologue_end,
        epilogue = lines.len() - epilogue_start,
        "Program segmented"
    );

    Ok(LayerPartition {
        prologue: &lines[..prologue_end],
        layers,
        epilogue: &lines[epilogue_start..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Vec<&'static str> {
        vec![
            ";FLAVOR:Marlin",
            ";LAYER_COUNT:2",
            "G28",
            ";LAYER:0",
            "G1 X0 Y0 Z0.2 E1",
            ";TIME_ELAPSED:10.5",
            ";LAYER:1",
            "G1 X1 Y1 Z0.4 E2",
            ";TIME_ELAPSED:20.1",
            "M104 S0",
            ";End of Gcode",
        ]
    }

    #[test]
    fn test_annotation_parse() {
        assert_eq!(
            Annotation::parse(";LAYER_COUNT:120"),
            Some(Annotation::LayerCount("120"))
        );
        assert_eq!(
            Annotation::parse("  ;layer: 7 "),
            Some(Annotation::LayerStart("7"))
        );
        assert_eq!(
            Annotation::parse(";TIME_ELAPSED:1234.5"),
            Some(Annotation::LayerEnd)
        );
        assert_eq!(Annotation::parse(";TIME:6666"), None);
        assert_eq!(Annotation::parse(";MESH:part.stl"), None);
        assert_eq!(Annotation::parse("G1 X1 ;LAYER:3"), None);
    }

    #[test]
    fn test_segment_basic() {
        let lines = program();
        let partition = segment(&lines).unwrap();
        assert_eq!(partition.prologue, &lines[..3]);
        assert_eq!(partition.layer_count(), 2);
        assert_eq!(partition.layers[0].lines, &lines[3..6]);
        assert_eq!(partition.layers[1].lines, &lines[6..9]);
        assert_eq!(partition.layers[1].start_line, 6);
        assert_eq!(partition.layers[1].end_line, 8);
        assert_eq!(partition.epilogue, &lines[9..]);
        assert_eq!(partition.reassemble(), lines);
    }

    #[test]
    fn test_lines_between_layers_are_kept() {
        let lines = vec![
            ";LAYER_COUNT:2",
            ";LAYER:0",
            ";TIME_ELAPSED:1",
            "M117 between",
            ";LAYER:1",
            ";TIME_ELAPSED:2",
        ];
        let partition = segment(&lines).unwrap();
        assert_eq!(partition.layers[0].trailing, &["M117 between"]);
        assert!(partition.layers[1].trailing.is_empty());
        assert!(partition.epilogue.is_empty());
        assert_eq!(partition.reassemble(), lines);
    }

    #[test]
    fn test_missing_count() {
        let lines = [";LAYER:0", ";TIME_ELAPSED:1"];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::missing(MissingMarker::LayerCount)
        );
    }

    #[test]
    fn test_missing_start() {
        let lines = [";LAYER_COUNT:3", ";LAYER:0", ";TIME_ELAPSED:1", ";LAYER:2", ";TIME_ELAPSED:2"];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::missing(MissingMarker::LayerStart { layer: 1 })
        );
    }

    #[test]
    fn test_missing_end() {
        let lines = [";LAYER_COUNT:2", ";LAYER:0", ";TIME_ELAPSED:1", ";LAYER:1", "G1 X1 E1"];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::missing(MissingMarker::LayerEnd { layer: 1 })
        );
    }

    #[test]
    fn test_undeclared_layer() {
        let lines = [";LAYER_COUNT:1", ";LAYER:0", ";TIME_ELAPSED:1", ";LAYER:1", ";TIME_ELAPSED:2"];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::missing(MissingMarker::Undeclared {
                layer: 1,
                layer_count: 1,
                line_number: 4,
            })
        );
    }

    #[test]
    fn test_malformed_index() {
        let lines = [";LAYER_COUNT:1", ";LAYER:-1", ";TIME_ELAPSED:1"];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::MalformedIndex {
                line_number: 2,
                text: "-1".to_string(),
            }
        );

        let lines = [";LAYER_COUNT:two"];
        assert!(matches!(
            segment(&lines).unwrap_err(),
            SegmentError::MalformedIndex { line_number: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_markers() {
        let lines = [";LAYER_COUNT:1", ";LAYER_COUNT:1"];
        assert!(matches!(
            segment(&lines).unwrap_err(),
            SegmentError::DuplicateMarker {
                first_line: 1,
                line_number: 2,
                ..
            }
        ));

        let lines = [";LAYER_COUNT:1", ";LAYER:0", ";LAYER:0", ";TIME_ELAPSED:1"];
        assert!(matches!(
            segment(&lines).unwrap_err(),
            SegmentError::DuplicateMarker { line_number: 3, .. }
        ));
    }

    #[test]
    fn test_orphan_end() {
        let lines = [";LAYER_COUNT:1", ";TIME_ELAPSED:0", ";LAYER:0", ";TIME_ELAPSED:1"];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::OrphanLayerEnd { line_number: 2 }
        );
    }

    #[test]
    fn test_out_of_order_layers() {
        let lines = [
            ";LAYER_COUNT:2",
            ";LAYER:1",
            ";TIME_ELAPSED:1",
            ";LAYER:0",
            ";TIME_ELAPSED:2",
        ];
        assert_eq!(
            segment(&lines).unwrap_err(),
            SegmentError::OutOfOrder {
                layer: 1,
                line_number: 2,
            }
        );
    }

    #[test]
    fn test_repeated_end_extends_layer() {
        let lines = [";LAYER_COUNT:1", ";LAYER:0", ";TIME_ELAPSED:1", "G1 Z1 E1", ";TIME_ELAPSED:2", "M84"];
        let partition = segment(&lines).unwrap();
        assert_eq!(partition.layers[0].end_line, 4);
        assert_eq!(partition.epilogue, &["M84"]);
    }

    #[test]
    fn test_zero_layers() {
        let lines = [";LAYER_COUNT:0", "G28", "M84"];
        let partition = segment(&lines).unwrap();
        assert_eq!(partition.layer_count(), 0);
        assert_eq!(partition.prologue, &lines[..]);
        assert!(partition.epilogue.is_empty());
    }

    #[test]
    fn test_case_insensitive_markers() {
        let lines = [";layer_count:1", ";Layer:0", ";time_elapsed:3.0"];
        let partition = segment(&lines).unwrap();
        assert_eq!(partition.layers[0].lines.len(), 3);
    }
}
