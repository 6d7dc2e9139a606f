use jpegls::{decode, encode, FrameInfo};

fn gradient(width: usize, height: usize) -> Vec<i32> {
    (0..width * height)
        .map(|i| {
            let x = (i % width) as i32;
            let y = (i / width) as i32;
            (x * 3 + y * 5) % 256
        })
        .collect()
}

#[test]
fn lossless_round_trip_on_a_gradient_image() {
    let frame = FrameInfo {
        precision: 8,
        width: 64,
        height: 48,
    };
    let samples = gradient(64, 48);

    let encoded = encode(frame, 0, &samples).expect("encode should succeed");
    let (decoded_frame, near, decoded) = decode(&encoded).expect("decode should succeed");

    assert_eq!(decoded_frame, frame);
    assert_eq!(near, 0);
    assert_eq!(decoded, samples);
}

#[test]
fn near_lossless_round_trip_stays_within_bound() {
    let frame = FrameInfo {
        precision: 8,
        width: 64,
        height: 48,
    };
    let samples = gradient(64, 48);
    let near = 5u16;

    let encoded = encode(frame, near, &samples).expect("encode should succeed");
    let (_, decoded_near, decoded) = decode(&encoded).expect("decode should succeed");

    assert_eq!(decoded_near, near);
    for (original, reconstructed) in samples.iter().zip(decoded.iter()) {
        assert!((original - reconstructed).abs() <= near as i32);
    }
}

#[test]
fn near_lossless_compresses_smaller_than_lossless_on_noisy_data() {
    let frame = FrameInfo {
        precision: 8,
        width: 32,
        height: 32,
    };
    let samples: Vec<i32> = (0..32 * 32).map(|i| ((i * 97) % 251) as i32).collect();

    let lossless = encode(frame, 0, &samples).unwrap();
    let near_lossless = encode(frame, 8, &samples).unwrap();

    assert!(near_lossless.len() <= lossless.len());
}

#[test]
fn flat_image_round_trips_through_run_mode() {
    let frame = FrameInfo {
        precision: 8,
        width: 40,
        height: 20,
    };
    let samples = vec![77i32; 40 * 20];

    let encoded = encode(frame, 0, &samples).unwrap();
    let (_, _, decoded) = decode(&encoded).unwrap();
    assert_eq!(decoded, samples);
}

#[test]
fn rejects_sample_count_mismatch() {
    let frame = FrameInfo {
        precision: 8,
        width: 4,
        height: 4,
    };
    assert!(encode(frame, 0, &[0; 15]).is_err());
}
