/// Progress curves over `t ∈ [0, 1]`.
///
/// `Power1` is quadratic and `Power2` cubic, the naming used by common tween
/// libraries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Ease {
    Linear,
    #[default]
    Power1Out,
    Power2In,
    Power2Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t).powi(2),
            Ease::Power2In => t.powi(3),
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_pin_endpoints_for_every_curve() {
        for ease in [Ease::Linear, Ease::Power1Out, Ease::Power2In, Ease::Power2Out] {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
            assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
        }
    }

    #[test]
    fn should_lag_when_easing_in_and_lead_when_easing_out() {
        assert_eq!(Ease::Power2In.apply(0.5), 0.125);
        assert_eq!(Ease::Power2Out.apply(0.5), 0.875);
        assert_eq!(Ease::Power1Out.apply(0.5), 0.75);
    }
}
