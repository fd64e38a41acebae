use std::{sync::Arc, time::Instant};

use clap::ValueEnum;
use comfy_table::{
    CellAlignment, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};
use indicatif::ProgressBar;
use vkvec::{
    Array, Distribution, InverseOptions, Shape, VkContext,
    VkContextCreateInfo, VkVecError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BenchOp {
    Add,
    Sum,
    Transpose,
    Matmul,
    Sort,
    Inverse,
}

impl BenchOp {
    fn shape(
        self,
        size: u32,
    ) -> Shape {
        match self {
            BenchOp::Sort => Shape::vector(size),
            _ => Shape::matrix(size, size),
        }
    }

    fn run(
        self,
        a: &Array,
        b: &Array,
    ) -> Result<(), VkVecError> {
        match self {
            BenchOp::Add => a.add(b).map(drop),
            BenchOp::Sum => a.sum().map(drop),
            BenchOp::Transpose => a.transpose().map(drop),
            BenchOp::Matmul => a.matmul(b).map(drop),
            BenchOp::Sort => a.sort().map(drop),
            BenchOp::Inverse => a.inverse(InverseOptions::default()).map(drop),
        }
    }
}

pub fn handle_bench(
    op: BenchOp,
    size: u32,
    runs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let context = Arc::new(VkContext::new(VkContextCreateInfo::from_env())?);
    let shape = op.shape(size);
    println!("Operation: {op:?} on {shape}");

    let a = match op {
        // diagonally dominant so the iteration converges
        BenchOp::Inverse => Array::identity(&context, size)?.mul_scalar(size as f32)?.add(&Array::random(
            &context,
            shape,
            Distribution::Uniform { low: 0.0, high: 1.0 },
        )?)?,
        _ => Array::random(&context, shape, Distribution::Uniform { low: -1.0, high: 1.0 })?,
    };
    let b = Array::random(&context, shape, Distribution::Uniform { low: -1.0, high: 1.0 })?;

    // warm up pipelines
    let start = Instant::now();
    op.run(&a, &b)?;
    log::debug!("warm-up run took {:.3} ms", start.elapsed().as_secs_f64() * 1000.0);

    let progress_bar = ProgressBar::new(runs);
    progress_bar.set_position(0);
    let mut durations = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        let start = Instant::now();
        op.run(&a, &b)?;
        durations.push(start.elapsed().as_secs_f64() * 1000.0);
        progress_bar.inc(1);
    }
    progress_bar.finish();

    let throughput = durations
        .iter()
        .map(|duration| shape.elements() as f64 / duration / 1000.0)
        .collect::<Vec<f64>>();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"])
        .add_row(vec!["Elements", shape.elements().to_string().as_str()])
        .add_row(vec!["Time, ms", calculate_metric(&durations).as_str()])
        .add_row(vec!["Throughput, Melem/s", calculate_metric(&throughput).as_str()]);
    let column = table.column_mut(1).expect("Column not found");
    column.set_cell_alignment(CellAlignment::Right);
    println!("{table}");

    Ok(())
}

fn calculate_metric(data: &[f64]) -> String {
    if let (Some(mean), Some(std_dev)) = (mean(data), std_dev(data)) {
        format!("{:.3} ± {:.3}", mean, std_dev)
    } else {
        "-".to_string()
    }
}

fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    Some(data.iter().sum::<f64>() / data.len() as f64)
}

fn std_dev(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 2 {
        return None;
    }

    let mean = mean(data)?;

    let variance = data
        .iter()
        .map(|x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n as f64 - 1.0);

    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_needs_two_samples() {
        assert_eq!(calculate_metric(&[1.0]), "-");
        assert_eq!(calculate_metric(&[1.0, 3.0]), "2.000 ± 1.414");
    }

    #[test]
    fn sort_bench_uses_a_vector() {
        assert_eq!(BenchOp::Sort.shape(8), Shape::vector(8));
        assert_eq!(BenchOp::Matmul.shape(8), Shape::matrix(8, 8));
    }
}
