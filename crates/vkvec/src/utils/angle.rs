use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
    Gradians,
    Turns,
}

impl AngleUnit {
    /// Multiplier taking a value in this unit to radians.
    pub fn to_radians_factor(self) -> f32 {
        match self {
            AngleUnit::Radians => 1.0,
            AngleUnit::Degrees => PI / 180.0,
            AngleUnit::Gradians => PI / 200.0,
            AngleUnit::Turns => 2.0 * PI,
        }
    }

    /// Multiplier taking radians to this unit.
    pub fn from_radians_factor(self) -> f32 {
        1.0 / self.to_radians_factor()
    }

    pub fn convert(
        self,
        value: f32,
        target: AngleUnit,
    ) -> f32 {
        value * self.to_radians_factor() * target.from_radians_factor()
    }
}
