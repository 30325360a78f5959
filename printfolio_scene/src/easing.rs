/// Symmetric cubic ease-in-out: slow start, slow finish, `f(0.5) = 0.5`.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Maps a group-wide progress value onto one element's local timeline when
/// that element starts `delay` later than the first one.
pub fn staggered(progress: f32, delay: f32) -> f32 {
    if delay >= 1.0 {
        return if progress >= 1.0 { 1.0 } else { 0.0 };
    }
    ((progress - delay) / (1.0 - delay)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_is_symmetric_about_midpoint() {
        for step in 0..=20 {
            let t = step as f32 / 20.0;
            let mirrored = 1.0 - ease_in_out_cubic(1.0 - t);
            assert!((ease_in_out_cubic(t) - mirrored).abs() < 1e-6);
        }
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stagger_delays_and_clamps() {
        assert_eq!(staggered(0.2, 0.3), 0.0);
        assert_eq!(staggered(1.0, 0.3), 1.0);
        assert!((staggered(0.65, 0.3) - 0.5).abs() < 1e-6);
        assert_eq!(staggered(0.99, 1.2), 0.0);
    }
}
