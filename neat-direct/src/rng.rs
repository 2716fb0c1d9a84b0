use rand::Rng;

/// Bernoulli trials over any `Rng`.
///
/// Probabilities are compared against a uniform sample in
/// `[0, 1)`, so values outside of `[0, 1]` saturate instead
/// of panicking as `Rng::gen_bool` would.
pub(crate) trait Chance {
    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f32) -> bool;
}

impl<R: Rng> Chance for R {
    fn chance(&mut self, probability: f32) -> bool {
        self.gen::<f32>() < probability
    }
}
