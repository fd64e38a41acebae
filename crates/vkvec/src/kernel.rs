use std::fmt;

macro_rules! kernel_ops {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $suffix:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn suffix(self) -> &'static str {
                match self {
                    $($name::$variant => $suffix),*
                }
            }
        }
    };
}

kernel_ops!(FillOp {
    Constant => "constant",
    Identity => "identity",
});

kernel_ops!(RandomOp {
    Gaussian => "gaussian",
    Uniform => "uniform",
    UniformInt => "uniform_int",
    Binary => "binary",
    Sign => "sign",
    Dropout => "dropout",
    XavierUniform => "xavier_uniform",
    XavierNormal => "xavier_normal",
    HeUniform => "he_uniform",
    HeNormal => "he_normal",
    LecunNormal => "lecun_normal",
});

kernel_ops!(UnaryOp {
    Copy => "copy",
    Neg => "neg",
    Abs => "abs",
    Sqrt => "sqrt",
    Exp => "exp",
    Ln => "ln",
    Log10 => "log10",
    Floor => "floor",
    Ceil => "ceil",
    Round => "round",
    Sign => "sign",
    Not => "not",
    Reciprocal => "reciprocal",
    Square => "square",
    Sigmoid => "sigmoid",
    Relu => "relu",
    LeakyRelu => "leaky_relu",
    Tanh => "tanh",
    Sinh => "sinh",
    Cosh => "cosh",
    Sin => "sin",
    Cos => "cos",
    Tan => "tan",
    Asin => "asin",
    Acos => "acos",
    Atan => "atan",
    Clamp => "clamp",
    Affine => "affine",
});

kernel_ops!(
    /// Array with array, narrowed to the overlap of both shapes.
    BinaryOp {
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        Div => "div",
        Rem => "rem",
        Pow => "pow",
        Min => "min",
        Max => "max",
        Eq => "eq",
        Ne => "ne",
        Lt => "lt",
        Le => "le",
        Gt => "gt",
        Ge => "ge",
        And => "and",
        Or => "or",
        Xor => "xor",
    }
);

kernel_ops!(
    /// Array with a scalar; the `R*` variants put the scalar on the left.
    ScalarOp {
        Add => "add",
        Sub => "sub",
        RSub => "rsub",
        Mul => "mul",
        Div => "div",
        RDiv => "rdiv",
        Rem => "rem",
        Pow => "pow",
        RPow => "rpow",
        Min => "min",
        Max => "max",
        Eq => "eq",
        Ne => "ne",
        Lt => "lt",
        Le => "le",
        Gt => "gt",
        Ge => "ge",
    }
);

kernel_ops!(ReduceOp {
    Sum => "sum",
    Min => "min",
    Max => "max",
    MaxAbs => "maxabs",
    Moment => "moment",
});

kernel_ops!(
    /// Window statistic used by `Array::pool`.
    PoolKind {
        Max => "max",
        Min => "min",
        Mean => "mean",
        MaxAbs => "maxabs",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Rows,
    Cols,
    Depth,
}

impl Axis {
    pub const ALL: &'static [Axis] = &[Axis::Rows, Axis::Cols, Axis::Depth];

    fn singular(self) -> &'static str {
        match self {
            Axis::Rows => "row",
            Axis::Cols => "col",
            Axis::Depth => "depth",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Axis::Rows => "rows",
            Axis::Cols => "cols",
            Axis::Depth => "depth",
        }
    }
}

kernel_ops!(TriangularPart {
    Upper => "upper",
    Lower => "lower",
});

/// Every compute kernel the array façade dispatches.
///
/// `name()` is the artifact name produced by the build script: the shader
/// file stem followed by the `SPECIALIZE` value, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Fill(FillOp),
    Random(RandomOp),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Scalar(ScalarOp),
    Reduce(ReduceOp),
    Find,
    ScalarProduct,
    Transpose,
    Embed,
    Erase(Axis),
    Pool(PoolKind),
    Convolve,
    Concat(Axis),
    Mirror(Axis),
    Diagonal,
    Triangular(TriangularPart),
    Remap,
    Matmul,
    BitonicStep,
    Rank,
    PowerMatrix,
    LinearPredict,
}

impl Kernel {
    pub fn name(&self) -> String {
        match self {
            Kernel::Fill(op) => format!("fill_{}", op.suffix()),
            Kernel::Random(op) => format!("random_{}", op.suffix()),
            Kernel::Unary(op) => format!("unary_{}", op.suffix()),
            Kernel::Binary(op) => format!("binary_{}", op.suffix()),
            Kernel::Scalar(op) => format!("scalar_{}", op.suffix()),
            Kernel::Reduce(op) => format!("reduce_{}", op.suffix()),
            Kernel::Find => "find".to_string(),
            Kernel::ScalarProduct => "scalar_product".to_string(),
            Kernel::Transpose => "transpose".to_string(),
            Kernel::Embed => "embed".to_string(),
            Kernel::Erase(axis) => format!("erase_{}", axis.singular()),
            Kernel::Pool(kind) => format!("pool_{}", kind.suffix()),
            Kernel::Convolve => "convolve".to_string(),
            Kernel::Concat(axis) => format!("concat_{}", axis.plural()),
            Kernel::Mirror(axis) => format!("mirror_{}", axis.plural()),
            Kernel::Diagonal => "diagonal".to_string(),
            Kernel::Triangular(part) => format!("triangular_{}", part.suffix()),
            Kernel::Remap => "remap".to_string(),
            Kernel::Matmul => "matmul".to_string(),
            Kernel::BitonicStep => "bitonic_step".to_string(),
            Kernel::Rank => "rank".to_string(),
            Kernel::PowerMatrix => "power_matrix".to_string(),
            Kernel::LinearPredict => "linear_predict".to_string(),
        }
    }

    pub fn all() -> Vec<Kernel> {
        let mut kernels = Vec::new();
        kernels.extend(FillOp::ALL.iter().copied().map(Kernel::Fill));
        kernels.extend(RandomOp::ALL.iter().copied().map(Kernel::Random));
        kernels.extend(UnaryOp::ALL.iter().copied().map(Kernel::Unary));
        kernels.extend(BinaryOp::ALL.iter().copied().map(Kernel::Binary));
        kernels.extend(ScalarOp::ALL.iter().copied().map(Kernel::Scalar));
        kernels.extend(ReduceOp::ALL.iter().copied().map(Kernel::Reduce));
        kernels.extend(Axis::ALL.iter().copied().map(Kernel::Erase));
        kernels.extend(PoolKind::ALL.iter().copied().map(Kernel::Pool));
        kernels.extend(Axis::ALL.iter().copied().map(Kernel::Concat));
        kernels.extend(Axis::ALL.iter().copied().map(Kernel::Mirror));
        kernels.extend(TriangularPart::ALL.iter().copied().map(Kernel::Triangular));
        kernels.extend([
            Kernel::Find,
            Kernel::ScalarProduct,
            Kernel::Transpose,
            Kernel::Embed,
            Kernel::Convolve,
            Kernel::Diagonal,
            Kernel::Remap,
            Kernel::Matmul,
            Kernel::BitonicStep,
            Kernel::Rank,
            Kernel::PowerMatrix,
            Kernel::LinearPredict,
        ]);
        kernels
    }

    /// Number of storage buffers the kernel declares, in binding order.
    pub fn bindings(&self) -> usize {
        match self {
            Kernel::Fill(_) | Kernel::Random(_) | Kernel::BitonicStep => 1,
            Kernel::Unary(_)
            | Kernel::Scalar(_)
            | Kernel::Find
            | Kernel::Transpose
            | Kernel::Embed
            | Kernel::Erase(_)
            | Kernel::Pool(_)
            | Kernel::Mirror(_)
            | Kernel::Diagonal
            | Kernel::Triangular(_)
            | Kernel::Rank
            | Kernel::PowerMatrix => 2,
            Kernel::Binary(_)
            | Kernel::Reduce(_)
            | Kernel::ScalarProduct
            | Kernel::Convolve
            | Kernel::Concat(_)
            | Kernel::Remap
            | Kernel::Matmul
            | Kernel::LinearPredict => 3,
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use super::*;

    fn shader_kernel_names() -> BTreeSet<String> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders");
        let mut names = BTreeSet::new();
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().and_then(|e| e.to_str()) != Some("comp") {
                continue;
            }
            let stem = path.file_stem().unwrap().to_str().unwrap().to_string();
            let source = std::fs::read_to_string(&path).unwrap();
            let values = source.lines().find_map(|line| {
                let compact = line.split_whitespace().collect::<String>();
                let inner = compact.strip_prefix("//SPECIALIZE(")?.strip_suffix(')')?;
                Some(inner.split(',').skip(1).map(str::to_string).collect::<Vec<_>>())
            });
            match values {
                Some(values) => {
                    for value in values {
                        names.insert(format!("{stem}_{value}"));
                    }
                },
                None => {
                    names.insert(stem);
                },
            }
        }
        names
    }

    #[test]
    fn every_kernel_has_a_shader() {
        let shaders = shader_kernel_names();
        let kernels = Kernel::all().iter().map(Kernel::name).collect::<BTreeSet<_>>();
        assert_eq!(kernels, shaders);
    }

    #[test]
    fn names_are_unique() {
        let all = Kernel::all();
        let names = all.iter().map(Kernel::name).collect::<BTreeSet<_>>();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn axis_names() {
        assert_eq!(Kernel::Erase(Axis::Cols).name(), "erase_col");
        assert_eq!(Kernel::Concat(Axis::Cols).name(), "concat_cols");
        assert_eq!(Kernel::Scalar(ScalarOp::RSub).name(), "scalar_rsub");
        assert_eq!(Kernel::Random(RandomOp::HeNormal).name(), "random_he_normal");
    }

    #[test]
    fn binding_counts_fit_layouts() {
        for kernel in Kernel::all() {
            assert!((1..=4).contains(&kernel.bindings()), "{kernel}");
        }
    }
}
