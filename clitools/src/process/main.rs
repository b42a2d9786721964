//! Offline replay tool: runs a raw two-channel PDM capture dump through the
//! fixed-point front-end and writes the resulting PCM to a WAV file.
//!
//! The dump format is the flat little-endian stream a host-side capture
//! writes: packed 32-bit PDM words alternating left, right, left, right.
//! Whole frames (320 word pairs) are processed; a trailing partial frame is
//! dropped.

use std::fs::File;
use std::io::Read;
use std::process::exit;

use log::{info, warn};
use pdm_dsp::config::{
    DEFAULT_DIGGAIN, DIGGAIN_OUT_FRAME_LEN, IN_FRAME_WORDS_PER_CH, OUT_SAMPLE_RATE_HZ,
};
use pdm_dsp::pipeline::Pipeline;

fn main() -> std::io::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        println!("Usage: process <capture.pdm> <out.wav> [diggain-u16q8]");
        exit(1);
    }

    let diggain: u16 = if args.len() > 3 {
        match args[3].parse() {
            Ok(g) => g,
            Err(_) => {
                println!("Bad gain value '{}', expected a U16Q8 integer (256 = 0 dB)", args[3]);
                exit(1);
            }
        }
    } else {
        DEFAULT_DIGGAIN
    };

    let mut raw = Vec::new();
    File::open(&args[1])?.read_to_end(&mut raw)?;

    let mut words: Vec<u32> = raw
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    if raw.len() % 4 != 0 {
        warn!("dropping {} trailing bytes (not a whole word)", raw.len() % 4);
    }
    // words alternate left/right; keep whole frames only
    let words_per_frame = 2 * IN_FRAME_WORDS_PER_CH;
    let num_frames = words.len() / words_per_frame;
    let dropped = words.len() - num_frames * words_per_frame;
    if dropped > 0 {
        warn!("dropping {dropped} trailing words (partial frame)");
    }
    words.truncate(num_frames * words_per_frame);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: OUT_SAMPLE_RATE_HZ,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&args[2], spec)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let mut pipeline = Pipeline::new(diggain);
    let mut left = [0u32; IN_FRAME_WORDS_PER_CH];
    let mut right = [0u32; IN_FRAME_WORDS_PER_CH];
    let mut pcm = [0i16; DIGGAIN_OUT_FRAME_LEN];

    for frame in words.chunks_exact(words_per_frame) {
        for (i, pair) in frame.chunks_exact(2).enumerate() {
            left[i] = pair[0];
            right[i] = pair[1];
        }
        pipeline.process_frame(&left, &right, &mut pcm);
        for &s in &pcm {
            writer
                .write_sample(s)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    info!(
        "{} frames ({} samples) written to {}",
        pipeline.frames_processed(),
        pipeline.frames_processed() as usize * DIGGAIN_OUT_FRAME_LEN,
        args[2]
    );
    Ok(())
}
