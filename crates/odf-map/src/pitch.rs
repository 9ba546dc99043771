//! Tuning offsets between a recorded sample and the pipe it stands for.

/// Offsets beyond one octave mean the sample belongs to another pipe.
pub const MAX_OFFSET_CENTS: f64 = 1200.0;

/// How a sample states its own pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplePitch {
    /// Recorded at this MIDI note.
    Note(i64),
    /// Recorded at this frequency in Hz.
    Frequency(f64),
    /// At the pitch implied by the rank's harmonic number.
    Harmonic(f64),
}

/// Equal-tempered frequency of a MIDI note at A4 = 440 Hz.
pub fn note_frequency(note: f64) -> f64 {
    440.0 * 2f64.powf((note - 69.0) / 12.0)
}

/// Cents to add to the sample so it sounds as `pipe_note` of a rank whose
/// 8' harmonic number is `rank_harmonic`.
pub fn offset_cents(pipe_note: i64, sample: SamplePitch, rank_harmonic: f64) -> f64 {
    let cents = match sample {
        SamplePitch::Note(sample_note) => (pipe_note - sample_note) as f64 * 100.0,
        SamplePitch::Frequency(frequency) => {
            let target = note_frequency(pipe_note as f64) * rank_harmonic / 8.0;
            1200.0 * (target / frequency).log2()
        }
        SamplePitch::Harmonic(_) => 0.0,
    };
    (cents * 100.0).round() / 100.0
}

/// Shortest text for a real value: `12`, `-3.5`, `0.25`.
pub fn format_real(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_offsets_are_whole_semitones() {
        assert_eq!(offset_cents(60, SamplePitch::Note(60), 8.0), 0.0);
        assert_eq!(offset_cents(62, SamplePitch::Note(60), 8.0), 200.0);
        assert_eq!(offset_cents(48, SamplePitch::Note(60), 8.0), -1200.0);
    }

    #[test]
    fn frequency_offsets_follow_the_rank_footage() {
        assert_eq!(offset_cents(69, SamplePitch::Frequency(440.0), 8.0), 0.0);
        assert_eq!(offset_cents(69, SamplePitch::Frequency(880.0), 16.0), 0.0);
        assert_eq!(offset_cents(69, SamplePitch::Frequency(436.0), 8.0), 15.81);
    }

    #[test]
    fn harmonic_pitch_needs_no_offset() {
        assert_eq!(offset_cents(30, SamplePitch::Harmonic(16.0), 8.0), 0.0);
    }

    #[test]
    fn reals_print_compactly() {
        assert_eq!(format_real(12.0), "12");
        assert_eq!(format_real(-3.5), "-3.5");
        assert_eq!(format_real(15.806), "15.81");
        assert_eq!(format_real(-0.001), "0");
    }
}
