use std::fmt::{self, Write};

use super::{Array, Shape};
use crate::error::VkVecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintLayout {
    /// Every element on one line.
    Inline,
    /// One line per row, depth slices separated by a header.
    #[default]
    Grid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintOptions {
    pub delimiter: String,
    pub show_indices: bool,
    pub layout: PrintLayout,
    /// Decimal places; negative prints the shortest exact representation.
    pub precision: i32,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            delimiter: ", ".to_string(),
            show_indices: false,
            layout: PrintLayout::Grid,
            precision: 4,
        }
    }
}

fn format_value(
    value: f32,
    precision: i32,
) -> String {
    match usize::try_from(precision) {
        Ok(precision) => format!("{value:.precision$}"),
        Err(_) => format!("{value}"),
    }
}

/// Renders `values` laid out as `shape`.
pub fn format_values(
    shape: Shape,
    values: &[f32],
    options: &PrintOptions,
) -> String {
    let (rows, cols, depth) = (shape.rows as usize, shape.cols as usize, shape.depth as usize);
    let mut out = String::new();
    match options.layout {
        PrintLayout::Inline => {
            let cells = (0..shape.elements().min(values.len()))
                .map(|i| {
                    let value = format_value(values[i], options.precision);
                    if options.show_indices {
                        let (r, c, d) = (i / (cols * depth), i / depth % cols, i % depth);
                        format!("({r},{c},{d})={value}")
                    } else {
                        value
                    }
                })
                .collect::<Vec<_>>();
            let _ = write!(out, "[{}]", cells.join(&options.delimiter));
        },
        PrintLayout::Grid => {
            for d in 0..depth {
                if depth > 1 {
                    if d > 0 {
                        out.push('\n');
                    }
                    let _ = writeln!(out, "depth {d}:");
                }
                for r in 0..rows {
                    if options.show_indices {
                        let _ = write!(out, "{r}: ");
                    }
                    let row = (0..cols)
                        .filter_map(|c| values.get(shape.flat_index(r, c, d)))
                        .map(|&value| format_value(value, options.precision))
                        .collect::<Vec<_>>();
                    let _ = writeln!(out, "{}", row.join(&options.delimiter));
                }
            }
        },
    }
    out
}

impl Array {
    pub fn format(
        &self,
        options: &PrintOptions,
    ) -> Result<String, VkVecError> {
        Ok(format_values(self.shape, &self.read()?, options))
    }

    /// Writes the formatted array to stdout.
    pub fn print(
        &self,
        options: &PrintOptions,
    ) -> Result<(), VkVecError> {
        let text = self.format(options)?;
        println!("{}", text.trim_end_matches('\n'));
        Ok(())
    }
}

impl fmt::Display for Array {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let text = self.format(&PrintOptions::default()).map_err(|_| fmt::Error)?;
        f.write_str(text.trim_end_matches('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_layout() {
        let text = format_values(Shape::matrix(2, 2), &[1.0, 2.0, 3.0, 4.5], &PrintOptions::default());
        assert_eq!(text, "1.0000, 2.0000\n3.0000, 4.5000\n");
    }

    #[test]
    fn inline_with_indices() {
        let options = PrintOptions {
            delimiter: " ".to_string(),
            show_indices: true,
            layout: PrintLayout::Inline,
            precision: 1,
        };
        let text = format_values(Shape::new(1, 2, 1), &[0.3, -1.0], &options);
        assert_eq!(text, "[(0,0,0)=0.3 (0,1,0)=-1.0]");
    }

    #[test]
    fn negative_precision_prints_full_value() {
        let options = PrintOptions {
            precision: -1,
            layout: PrintLayout::Inline,
            ..PrintOptions::default()
        };
        assert_eq!(format_values(Shape::vector(2), &[0.125, 3.0], &options), "[0.125, 3]");
    }

    #[test]
    fn depth_slices_have_headers() {
        let options = PrintOptions {
            precision: 0,
            show_indices: true,
            ..PrintOptions::default()
        };
        // flat order is depth fastest: (0,0,0)=1 (0,0,1)=2 (1,0,0)=3 (1,0,1)=4
        let text = format_values(Shape::new(2, 1, 2), &[1.0, 2.0, 3.0, 4.0], &options);
        assert_eq!(text, "depth 0:\n0: 1\n1: 3\n\ndepth 1:\n0: 2\n1: 4\n");
    }
}
