use std::sync::Arc;

use console::Style;
use vkvec::{
    Array, Distribution, InverseOptions, PrintLayout, PrintOptions, Shape,
    VkContext, VkContextCreateInfo,
};

fn section(title: &str) {
    println!("\n{}", Style::new().bold().cyan().apply_to(title));
}

pub fn handle_demo() -> Result<(), Box<dyn std::error::Error>> {
    let context = Arc::new(VkContext::new(VkContextCreateInfo::from_env())?);
    let inline = PrintOptions {
        layout: PrintLayout::Inline,
        precision: 2,
        ..PrintOptions::default()
    };

    section("Arithmetic");
    let a = Array::from_slice(&context, Shape::vector(3), &[1.0, 2.0, 3.0])?;
    let b = a.add_scalar(1.0)?;
    let twos = Array::filled(&context, Shape::vector(3), 2.0)?;
    let c = b.mul(&twos)?;
    println!("a           = {}", a.format(&inline)?);
    println!("a + 1       = {}", b.format(&inline)?);
    println!("(a + 1) * 2 = {}", c.format(&inline)?);
    println!("sum         = {}", c.sum()?);
    let copy = c.div_scalar(0.0)?;
    println!("c / 0       = {} (copy)", copy.format(&inline)?);

    section("Statistics");
    let samples = Array::random(&context, Shape::vector(4096), Distribution::Gaussian { mean: 3.0, std_dev: 0.5 })?;
    println!("mean     = {:.4}", samples.mean()?);
    println!("stddev   = {:.4}", samples.stddev()?);
    println!("skewness = {:.4}", samples.skewness()?);
    println!("kurtosis = {:.4}", samples.kurtosis()?);
    println!("median   = {:.4}", samples.median()?);

    section("Linear algebra");
    let m = Array::from_slice(&context, (3, 3), &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0])?;
    let inverse = m.inverse(InverseOptions::default())?;
    println!("A =\n{m}");
    println!("A^-1 =\n{inverse}");
    println!("A . A^-1 =\n{}", m.matmul(&inverse)?);

    section("Regression");
    let x = Array::from_slice(&context, Shape::vector(6), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;
    let y = Array::from_slice(&context, Shape::vector(6), &[1.1, 2.9, 5.2, 7.1, 8.8, 11.0])?;
    let fit = x.pearson(&y)?;
    println!("r = {:.4}, y = {:.3} x + {:.3}", fit.coefficient, fit.slope, fit.intercept);
    let regression = x.polynomial_regression(&y, 2)?;
    println!(
        "quadratic coefficients = {}, R^2 = {:.4}",
        regression.coefficients.format(&inline)?,
        regression.r_squared
    );

    Ok(())
}
