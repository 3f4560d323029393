//! MP3 decode (symphonia) and encode (LAME) used by the re-encode merge policy.

use super::error::AssemblyError;
use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm, Quality};
use std::io::Cursor;
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

/// Samples per channel in one MPEG-1 Layer III frame
pub const SAMPLES_PER_FRAME: usize = 1152;

/// LAME asks for at least this much room when flushing
const FLUSH_BUFFER_BYTES: usize = 7200;

const ENCODE_BITRATE: Bitrate = Bitrate::Kbps128;

/// Decoded audio, one sample vector per channel, samples in `[-1, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PcmAudio {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Append `other` after this audio, keeping this audio's channel layout.
    /// A channel missing from `other` is filled from its first channel.
    pub fn append(&mut self, other: &PcmAudio) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(source) = other.channels.get(index).or_else(|| other.channels.first()) {
                channel.extend_from_slice(source);
            }
        }
    }
}

/// Decode a complete MP3 byte stream into planar samples
pub fn decode_mp3(bytes: &[u8]) -> Result<PcmAudio, AssemblyError> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AssemblyError::Decode(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AssemblyError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AssemblyError::Decode(e.to_string()))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AssemblyError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::debug!(reason = reason, "Skipping undecodable MP3 frame");
                continue;
            }
            Err(e) => return Err(AssemblyError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();
        if channel_count == 0 {
            continue;
        }
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }
        sample_rate.get_or_insert(spec.rate);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        for frame in buffer.samples().chunks(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| AssemblyError::Decode("unknown sample rate".to_string()))?;
    if channels.is_empty() {
        return Err(AssemblyError::Decode("no audio frames decoded".to_string()));
    }

    Ok(PcmAudio {
        sample_rate,
        channels,
    })
}

/// Encode planar samples as one MP3 stream, one frame's worth of samples at a time
pub fn encode_mp3(audio: &PcmAudio) -> Result<Vec<u8>, AssemblyError> {
    let channel_count = audio.channel_count();
    if !(1..=2).contains(&channel_count) {
        return Err(AssemblyError::Encode(format!(
            "unsupported channel count {}",
            channel_count
        )));
    }

    let mut builder = Builder::new()
        .ok_or_else(|| AssemblyError::Encode("could not allocate LAME encoder".to_string()))?;
    builder
        .set_num_channels(channel_count as u8)
        .map_err(encode_error)?;
    builder
        .set_sample_rate(audio.sample_rate)
        .map_err(encode_error)?;
    builder.set_brate(ENCODE_BITRATE).map_err(encode_error)?;
    builder.set_quality(Quality::Good).map_err(encode_error)?;
    let mut encoder = builder.build().map_err(encode_error)?;

    let left: Vec<i16> = audio.channels[0].iter().copied().map(to_i16).collect();
    let right: Vec<i16> = match audio.channels.get(1) {
        Some(channel) => channel.iter().copied().map(to_i16).collect(),
        None => Vec::new(),
    };

    let mut output = Vec::new();
    let frames = left.len();
    let mut start = 0;
    while start < frames {
        let end = (start + SAMPLES_PER_FRAME).min(frames);
        output.reserve(mp3lame_encoder::max_required_buffer_size(end - start));
        let encoded = if channel_count == 2 {
            let block = DualPcm {
                left: &left[start..end],
                right: &right[start..end],
            };
            encoder.encode_to_vec(block, &mut output)
        } else {
            encoder.encode_to_vec(MonoPcm(&left[start..end]), &mut output)
        };
        encoded.map_err(encode_error)?;
        start = end;
    }

    output.reserve(FLUSH_BUFFER_BYTES);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut output)
        .map_err(encode_error)?;

    Ok(output)
}

/// Clamp to `[-1, 1]` and scale onto the signed 16-bit range
pub fn to_i16(sample: f32) -> i16 {
    let sample = sample.clamp(-1.0, 1.0);
    if sample < 0.0 {
        (sample * 32768.0) as i16
    } else {
        (sample * 32767.0) as i16
    }
}

fn encode_error<E: std::fmt::Debug>(err: E) -> AssemblyError {
    AssemblyError::Encode(format!("{:?}", err))
}
