use serde::{Deserialize, Serialize};

/// The functions available for neurons to
/// compute their activation level from their input sum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    /// The logistic function, `1 / (1 + e^-x)`.
    #[default]
    Sigmoid,
    Identity,
    ReLU,
    Tanh,
    /// `e^(-x^2)`.
    Gaussian,
    /// `sin(πx)`.
    Sinusoidal,
}

impl ActivationType {
    /// Applies the function to an input sum.
    ///
    /// # Examples
    /// ```
    /// use neat_direct::networks::ActivationType;
    ///
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::ReLU.apply(-3.0), 0.0);
    /// assert_eq!(ActivationType::Identity.apply(-3.0), -3.0);
    /// ```
    pub fn apply(self, input_sum: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-input_sum).exp()),
            ActivationType::Identity => input_sum,
            ActivationType::ReLU => input_sum.max(0.0),
            ActivationType::Tanh => input_sum.tanh(),
            ActivationType::Gaussian => (-input_sum.powi(2)).exp(),
            ActivationType::Sinusoidal => (input_sum * std::f32::consts::PI).sin(),
        }
    }
}
