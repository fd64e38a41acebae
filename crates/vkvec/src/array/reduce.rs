use super::{Array, Shape, transform};
use crate::backends::vulkan::{PushConstants, VkDispatch};
use crate::error::VkVecError;
use crate::kernel::{Kernel, ReduceOp};

impl Array {
    pub fn sum(&self) -> Result<f32, VkVecError> {
        self.reduce(ReduceOp::Sum, 0.0, 0.0)
    }

    /// NaN for an empty array.
    pub fn mean(&self) -> Result<f32, VkVecError> {
        Ok(self.sum()? / self.elements() as f32)
    }

    /// Population variance.
    pub fn variance(&self) -> Result<f32, VkVecError> {
        let mean = self.mean()?;
        self.central_moment(mean, 2)
    }

    pub fn stddev(&self) -> Result<f32, VkVecError> {
        Ok(self.variance()?.sqrt())
    }

    /// Zero for a constant array.
    pub fn skewness(&self) -> Result<f32, VkVecError> {
        let mean = self.mean()?;
        let variance = self.central_moment(mean, 2)?;
        if variance == 0.0 {
            return Ok(0.0);
        }
        Ok(self.central_moment(mean, 3)? / variance.powf(1.5))
    }

    /// Excess kurtosis; zero for a constant array.
    pub fn kurtosis(&self) -> Result<f32, VkVecError> {
        let mean = self.mean()?;
        let variance = self.central_moment(mean, 2)?;
        if variance == 0.0 {
            return Ok(0.0);
        }
        Ok(self.central_moment(mean, 4)? / (variance * variance) - 3.0)
    }

    fn central_moment(
        &self,
        mean: f32,
        power: u32,
    ) -> Result<f32, VkVecError> {
        Ok(self.reduce(ReduceOp::Moment, mean, power as f32)? / self.elements() as f32)
    }

    /// `+inf` for an empty array.
    pub fn min(&self) -> Result<f32, VkVecError> {
        self.reduce(ReduceOp::Min, 0.0, 0.0)
    }

    /// `-inf` for an empty array.
    pub fn max(&self) -> Result<f32, VkVecError> {
        self.reduce(ReduceOp::Max, 0.0, 0.0)
    }

    pub fn maxabs(&self) -> Result<f32, VkVecError> {
        self.reduce(ReduceOp::MaxAbs, 0.0, 0.0)
    }

    /// Middle value of the sorted vector, or the mean of the two middle
    /// values for an even length.
    pub fn median(&self) -> Result<f32, VkVecError> {
        self.require_vector("median")?;
        let n = self.elements();
        if n == 0 {
            log::warn!("Median of an empty array");
            return Ok(f32::NAN);
        }
        let sorted = self.sort()?;
        if n % 2 == 1 {
            sorted.get_flat(n / 2)
        } else {
            Ok((sorted.get_flat(n / 2 - 1)? + sorted.get_flat(n / 2)?) / 2.0)
        }
    }

    /// Flat index of the first element equal to `value`.
    pub fn find(
        &self,
        value: f32,
    ) -> Result<Option<usize>, VkVecError> {
        let result = self.scratch(1)?;
        result.fill_words(u32::MAX)?;
        self.run(&[VkDispatch::new(Kernel::Find)
            .buffers(&[&self.buffer, &result])
            .push_constants(PushConstants::new().shape(self.shape).f32(value))
            .invocations(self.elements())])?;
        let index = result.read_as::<u32>()?[0];
        Ok((index != u32::MAX).then_some(index as usize))
    }

    /// Sum of elementwise products over the overlap of both shapes.
    pub fn scalar_product(
        &self,
        other: &Array,
    ) -> Result<f32, VkVecError> {
        let result = self.scratch(1)?;
        self.run(&[VkDispatch::new(Kernel::ScalarProduct)
            .buffers(&[&self.buffer, &other.buffer, &result])
            .push_constants(PushConstants::new().shape(self.shape).shape(other.shape))
            .invocations(self.shape.overlap(&other.shape).elements())])?;
        Ok(result.get(0)?)
    }

    /// Euclidean (Frobenius) norm.
    pub fn norm(&self) -> Result<f32, VkVecError> {
        Ok(self.scalar_product(self)?.sqrt())
    }

    /// Affinely maps `[min, max]` onto `[low, high]`. A constant array maps
    /// to `low`.
    pub fn scale_minmax(
        &self,
        low: f32,
        high: f32,
    ) -> Result<Array, VkVecError> {
        let min = self.min()?;
        let max = self.max()?;
        if max == min {
            return Array::filled(&self.context, self.shape, low);
        }
        let scale = (high - low) / (max - min);
        self.affine(scale, low - min * scale)
    }

    /// Zero mean and unit standard deviation. A constant array is only
    /// centred.
    pub fn standardize(&self) -> Result<Array, VkVecError> {
        let mean = self.mean()?;
        let stddev = self.central_moment(mean, 2)?.sqrt();
        if stddev == 0.0 {
            log::warn!("Standard deviation is zero, only centring the array");
            return self.sub_scalar(mean);
        }
        self.affine(1.0 / stddev, -mean / stddev)
    }

    /// Ascending sort of the flat elements; the shape is kept.
    ///
    /// Pads to the next power of two with `+inf`, runs the bitonic network
    /// in one batch and crops back.
    pub fn sort(&self) -> Result<Array, VkVecError> {
        let n = self.elements();
        if n <= 1 {
            return self.try_clone();
        }
        let padded = n.next_power_of_two();
        let flat = Shape::vector(n as u32);
        let padded_shape = Shape::vector(padded as u32);
        let work = self.scratch(padded)?;
        let out = self.alike(self.shape)?;

        let mut dispatches = vec![transform::embed_dispatch(
            &self.buffer,
            flat,
            &work,
            padded_shape,
            (0, 0),
            f32::INFINITY,
        )];
        let mut k = 2;
        while k <= padded {
            let mut j = k / 2;
            while j > 0 {
                dispatches.push(
                    VkDispatch::new(Kernel::BitonicStep)
                        .buffer(&work)
                        .push_constants(PushConstants::new().shape(padded_shape).u32(k as u32).u32(j as u32))
                        .invocations(padded),
                );
                j /= 2;
            }
            k *= 2;
        }
        dispatches.push(transform::embed_dispatch(&work, padded_shape, &out.buffer, flat, (0, 0), 0.0));
        self.run(&dispatches)?;
        Ok(out)
    }

    /// Average 1-based ranks; ties share the mean of their positions.
    pub fn rank(&self) -> Result<Array, VkVecError> {
        self.require_vector("rank")?;
        let out = self.alike(self.shape)?;
        self.run(&[VkDispatch::new(Kernel::Rank)
            .buffers(&[&self.buffer, &out.buffer])
            .push_constants(PushConstants::new().shape(self.shape).shape(out.shape))
            .invocations(self.elements())])?;
        Ok(out)
    }
}
