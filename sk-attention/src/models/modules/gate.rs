//! # Gate Network
//!
//! Turns the per-channel descriptor into one attention logit per branch and
//! channel. A shared projection squeezes the descriptor into the bottleneck,
//! then every branch expands it with its own projection.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
};

/// Configuration for the [`Gate`] module.
#[derive(Config, Debug)]
pub struct GateConfig {
    /// Channels of the descriptor and of every branch logit vector.
    channels: usize,
    /// Bottleneck size.
    bottleneck: usize,
    /// Number of branches, one expanding projection each.
    num_branches: usize,
}

impl GateConfig {
    /// Initializes a new `Gate` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> Gate<B> {
        let fc = LinearConfig::new(self.channels, self.bottleneck).init(device);
        let fcs = (0..self.num_branches)
            .map(|_| LinearConfig::new(self.bottleneck, self.channels).init(device))
            .collect();

        Gate { fc, fcs }
    }
}

/// Shared squeeze projection followed by per-branch expansions.
#[derive(Module, Debug)]
pub struct Gate<B: Backend> {
    fc: Linear<B>,
    fcs: Vec<Linear<B>>,
}

impl<B: Backend> Gate<B> {
    /// Computes the bottleneck vector and the stacked branch logits.
    ///
    /// Each expanding projection reads the same bottleneck vector; the logits
    /// are stacked in branch order and shaped for broadcasting over space.
    ///
    /// # Shapes
    /// - descriptor: `[batch, channels]`
    /// - bottleneck: `[batch, d]`
    /// - logits: `[branches, batch, channels, 1, 1]`
    pub fn forward(&self, descriptor: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 5>) {
        let [batch, channels] = descriptor.dims();
        let z = self.fc.forward(descriptor);

        let logits = self
            .fcs
            .iter()
            .map(|fc| fc.forward(z.clone()).reshape([batch, channels, 1, 1]))
            .collect::<Vec<Tensor<B, 4>>>();

        (z, Tensor::stack(logits, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
        tensor::Distribution,
    };

    type TestBackend = NdArray;
    type TestDevice = NdArrayDevice;

    #[test]
    fn test_gate_shapes() {
        let device = TestDevice::default();
        let gate = GateConfig::new(16, 4, 3).init::<TestBackend>(&device);
        let s = Tensor::<TestBackend, 2>::random([2, 16], Distribution::Default, &device);

        let (z, logits) = gate.forward(s);

        assert_eq!(gate.fcs.len(), 3);
        assert_eq!(z.dims(), [2, 4]);
        assert_eq!(logits.dims(), [3, 2, 16, 1, 1]);
    }

    #[test]
    fn test_branch_projections_are_independent() {
        let device = TestDevice::default();
        let gate = GateConfig::new(8, 4, 2).init::<TestBackend>(&device);
        let s = Tensor::<TestBackend, 2>::random([1, 8], Distribution::Normal(0.0, 1.0), &device);

        let (_, logits) = gate.forward(s);
        let first = logits.clone().narrow(0, 0, 1);
        let second = logits.narrow(0, 1, 1);

        let diff = (first - second).abs().max().into_scalar();
        assert!(diff > 0.0, "each branch should own its projection");
    }

    #[test]
    fn test_every_projection_receives_gradient() {
        let device = Default::default();
        let gate = GateConfig::new(8, 4, 3).init::<Autodiff<TestBackend>>(&device);
        let s = Tensor::<Autodiff<TestBackend>, 2>::random(
            [2, 8],
            Distribution::Normal(0.0, 1.0),
            &device,
        );

        let (_, logits) = gate.forward(s);
        let grads = logits.powf_scalar(2.0).sum().backward();

        assert!(gate.fc.weight.grad(&grads).is_some());
        for fc in &gate.fcs {
            assert!(fc.weight.grad(&grads).is_some());
        }
    }
}
