// Robustness of the receive chain against silence, noise, unrelated
// signals, and bit corruption under the repetition factor.

use std::f64::consts::PI;

use tonelink_core::{
    DecodeOptions, DecodeResult, Decoder, Encoder, GUARD_SAMPLES, SAMPLES_PER_BIT, SAMPLE_RATE,
};

fn data_opts() -> DecodeOptions {
    DecodeOptions::default()
}

#[test]
fn test_decode_with_leading_silence() {
    let encoder = Encoder::new();
    let decoder = Decoder::new();

    let samples = encoder.build_data(b"padded", 1).expect("Failed to encode");
    let mut padded = vec![0i16; 5000];
    padded.extend_from_slice(&samples);

    let result = decoder.decode(&padded, &data_opts()).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::DataOk {
            unit_id: 1,
            payload: b"padded".to_vec()
        }
    );
}

#[test]
fn test_decode_with_trailing_silence() {
    let encoder = Encoder::new();
    let decoder = Decoder::new();

    let mut samples = encoder.build_data(b"padded", 1).expect("Failed to encode");
    samples.extend(vec![0i16; 5000]);

    let result = decoder.decode(&samples, &data_opts()).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::DataOk {
            unit_id: 1,
            payload: b"padded".to_vec()
        }
    );
}

#[test]
fn test_decode_with_silence_both_sides() {
    let encoder = Encoder::new();
    let decoder = Decoder::new();

    let samples = encoder.build_data(b"padded", 1).expect("Failed to encode");
    let mut padded = vec![0i16; 1000];
    padded.extend_from_slice(&samples);
    padded.extend(vec![0i16; 5000]);

    let result = decoder.decode(&padded, &data_opts()).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::DataOk {
            unit_id: 1,
            payload: b"padded".to_vec()
        }
    );
}

#[test]
fn test_decode_with_additive_noise() {
    let encoder = Encoder::new();
    let decoder = Decoder::new();

    let mut samples = encoder.build_data(b"noisy channel", 6).expect("Failed to encode");
    // Deterministic pseudo-noise at roughly 5% of full scale
    for (i, sample) in samples.iter_mut().enumerate() {
        let noise = ((i as f64) * 0.37).sin() * 1600.0;
        *sample = sample.saturating_add(noise as i16);
    }

    let result = decoder.decode(&samples, &data_opts()).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::DataOk {
            unit_id: 6,
            payload: b"noisy channel".to_vec()
        }
    );
}

#[test]
fn test_unrelated_tone_is_invalid() {
    // Two seconds of a 440 Hz sine carry no start flag
    let decoder = Decoder::new();
    let samples: Vec<i16> = (0..2 * SAMPLE_RATE)
        .map(|n| {
            let t = n as f64 / SAMPLE_RATE as f64;
            (0.4 * 32767.0 * (2.0 * PI * 440.0 * t).sin()) as i16
        })
        .collect();

    let result = decoder.decode(&samples, &data_opts()).expect("Failed to decode");
    assert_eq!(result, DecodeResult::Invalid);
}

#[test]
fn test_pure_silence_is_invalid() {
    let decoder = Decoder::new();
    let samples = vec![0i16; SAMPLES_PER_BIT * 64];
    let result = decoder.decode(&samples, &data_opts()).expect("Failed to decode");
    assert_eq!(result, DecodeResult::Invalid);
}

#[test]
fn test_repeat_factor_round_trip() {
    let encoder = Encoder::with_repeat(3);
    let decoder = Decoder::with_repeat(3);

    let samples = encoder.build_data(b"slow but sure", 5).expect("Failed to encode");
    let result = decoder.decode(&samples, &data_opts()).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::DataOk {
            unit_id: 5,
            payload: b"slow but sure".to_vec()
        }
    );
}

#[test]
fn test_repeat_factor_recovers_from_corrupted_window() {
    let encoder = Encoder::with_repeat(3);
    let decoder = Decoder::with_repeat(3);

    let mut samples = encoder.build_data(b"voted", 5).expect("Failed to encode");
    // Blank one bit-length window inside the tone burst; the other two
    // copies of the affected bit win the majority vote
    let start = GUARD_SAMPLES + 41 * SAMPLES_PER_BIT;
    for sample in &mut samples[start..start + SAMPLES_PER_BIT] {
        *sample = 0;
    }

    let result = decoder.decode(&samples, &data_opts()).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::DataOk {
            unit_id: 5,
            payload: b"voted".to_vec()
        }
    );
}

#[test]
fn test_repeat_factor_round_trip_auth() {
    let encoder = Encoder::with_repeat(2);
    let decoder = Decoder::with_repeat(2);

    let samples = encoder.build_auth("door_key_123", 7).expect("Failed to encode");
    let opts = DecodeOptions {
        expected_mode: tonelink_core::ExpectedMode::Auth,
        expected_secret: Some("door_key_123".to_string()),
        ..Default::default()
    };
    let result = decoder.decode(&samples, &opts).expect("Failed to decode");
    assert_eq!(
        result,
        DecodeResult::AuthOk {
            unit_id: 7,
            granted: true
        }
    );
}
