//! Statistics tracking for AAE training.

use super::StepLosses;
use std::collections::VecDeque;

/// Number of recent values kept per loss history
pub const HISTORY_LEN: usize = 100;

/// Statistics from AAE training
#[derive(Debug, Clone)]
pub struct AaeStats {
    /// Total training steps
    pub steps: usize,
    /// Reconstruction losses (recent history)
    pub dec_losses: VecDeque<f32>,
    /// Discriminator losses (recent history)
    pub disc_losses: VecDeque<f32>,
    /// Encoder adversarial losses (recent history)
    pub enc_losses: VecDeque<f32>,
    /// Joint generator losses (recent history)
    pub gen_losses: VecDeque<f32>,
}

impl Default for AaeStats {
    fn default() -> Self {
        Self {
            steps: 0,
            dec_losses: VecDeque::with_capacity(HISTORY_LEN),
            disc_losses: VecDeque::with_capacity(HISTORY_LEN),
            enc_losses: VecDeque::with_capacity(HISTORY_LEN),
            gen_losses: VecDeque::with_capacity(HISTORY_LEN),
        }
    }
}

impl AaeStats {
    /// Record one training step
    pub fn record(&mut self, losses: &StepLosses) {
        self.steps += 1;
        push_bounded(&mut self.dec_losses, losses.dec_loss);
        push_bounded(&mut self.disc_losses, losses.disc_loss);
        push_bounded(&mut self.enc_losses, losses.enc_loss);
        push_bounded(&mut self.gen_losses, losses.gen_loss);
    }

    /// Average losses over the recent history
    #[must_use]
    pub fn recent_mean(&self) -> StepLosses {
        StepLosses {
            dec_loss: mean(&self.dec_losses),
            disc_loss: mean(&self.disc_losses),
            enc_loss: mean(&self.enc_losses),
            gen_loss: mean(&self.gen_losses),
        }
    }
}

fn push_bounded(history: &mut VecDeque<f32>, value: f32) {
    if history.len() >= HISTORY_LEN {
        history.pop_front();
    }
    history.push_back(value);
}

fn mean(values: &VecDeque<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn losses(v: f32) -> StepLosses {
        StepLosses {
            dec_loss: v,
            disc_loss: v,
            enc_loss: v,
            gen_loss: v,
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut stats = AaeStats::default();
        for i in 0..250 {
            stats.record(&losses(i as f32));
        }
        assert_eq!(stats.steps, 250);
        assert_eq!(stats.gen_losses.len(), HISTORY_LEN);
        assert_eq!(stats.gen_losses.front(), Some(&150.0));
    }

    #[test]
    fn test_recent_mean() {
        let mut stats = AaeStats::default();
        assert_eq!(stats.recent_mean().dec_loss, 0.0);
        stats.record(&losses(1.0));
        stats.record(&losses(3.0));
        assert_eq!(stats.recent_mean().disc_loss, 2.0);
    }
}
