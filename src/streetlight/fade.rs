// src/streetlight/fade.rs
//
// Bounded-step ramp. Each channel moves at most `step` toward its target
// per cycle and never overshoots.

use crate::types::Brightness;

pub fn step_toward(current: u8, target: u8, step: u8) -> u8 {
    if current < target {
        current.saturating_add(step).min(target)
    } else if current > target {
        current.saturating_sub(step).max(target)
    } else {
        current
    }
}

pub fn fade_step(current: Brightness, target: Brightness, step: u8) -> Brightness {
    Brightness::new(
        step_toward(current.channel_a, target.channel_a, step),
        step_toward(current.channel_b, target.channel_b, step),
    )
}

/// Cycles needed to converge: ceil(|Δ| / step) on the slower channel.
pub fn cycles_to_converge(current: Brightness, target: Brightness, step: u8) -> usize {
    if step == 0 {
        return if current == target { 0 } else { usize::MAX };
    }
    let delta_a = current.channel_a.abs_diff(target.channel_a) as usize;
    let delta_b = current.channel_b.abs_diff(target.channel_b) as usize;
    delta_a.max(delta_b).div_ceil(step as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ramp_takes_51_cycles_without_overshoot() {
        let target = Brightness::uniform(255);
        let mut current = Brightness::uniform(0);
        let mut cycles = 0;

        while current != target {
            let next = fade_step(current, target, 5);
            assert!(next.channel_a <= 255 && next.channel_a >= current.channel_a);
            assert!(next.channel_b >= current.channel_b);
            current = next;
            cycles += 1;
            assert!(cycles <= 51, "ramp did not converge in 51 cycles");
        }

        assert_eq!(cycles, 51);
        assert_eq!(cycles_to_converge(Brightness::uniform(0), target, 5), 51);
    }

    #[test]
    fn test_clamps_at_target_when_step_would_overshoot() {
        assert_eq!(step_toward(48, 50, 5), 50);
        assert_eq!(step_toward(52, 50, 5), 50);
        assert_eq!(step_toward(253, 255, 5), 255);
        assert_eq!(step_toward(3, 0, 5), 0);
        assert_eq!(step_toward(50, 50, 5), 50);
    }

    #[test]
    fn test_channels_move_independently() {
        let next = fade_step(Brightness::new(100, 40), Brightness::uniform(50), 5);
        assert_eq!(next, Brightness::new(95, 45));
    }

    #[test]
    fn test_dimming_is_monotonic() {
        let target = Brightness::uniform(50);
        let mut current = Brightness::uniform(255);
        let expected = cycles_to_converge(current, target, 5);
        let mut cycles = 0;
        while current != target {
            let next = fade_step(current, target, 5);
            assert!(next.channel_a < current.channel_a);
            assert!(next.channel_a >= 50);
            current = next;
            cycles += 1;
        }
        assert_eq!(cycles, expected);
        assert_eq!(cycles, 41);
    }
}
