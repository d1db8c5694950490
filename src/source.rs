//! The signal source contract (§6): an external collaborator supplying
//! PCM frames with a format descriptor. Decoding compressed audio is out
//! of the core's scope; this module only defines the contract, PCM byte
//! normalization, and (behind the `decode` feature) a bridge from an
//! actual decoder.

use crate::error::{Error, Result};
use crate::format::{AudioFormat, Encoding, Endian};
use crate::frame::Frame;

/// Outcome of one [`SignalSource::read`] call: a frame, or an explicit
/// end-of-stream sentinel rather than an error (§4.1, §7).
#[derive(Clone, Debug)]
pub enum ReadOutcome {
    Frame(Frame),
    EndOfStream,
}

/// `read()` / `reset()` / `close()`, per §6: pulls interleaved frames
/// from an external decoder or in-memory buffer.
pub trait SignalSource {
    fn read(&mut self) -> Result<ReadOutcome>;
    fn reset(&mut self) -> Result<()>;
    /// Releases resources held by the source. The default is a no-op,
    /// appropriate for in-memory sources.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Positive full-scale magnitude of a signed sample of `bits` width.
///
/// §9 flags the source's `2^(bits-1)` (e.g. `2^22` for 24-bit) against
/// the conventional PCM full-scale constant `2^(bits-1) - 1` (`2^23 -
/// 1` for 24-bit) as an open question. This resolves it in favor of the
/// conventional constant: `2^(bits-1)` leaves the sample value
/// `-2^(bits-1)` unrepresentable as `-1.0` and is not how WAV/AIFF
/// PCM24 full scale is defined elsewhere in the ecosystem. See
/// DESIGN.md.
fn signed_normalization_factor(bits: u32) -> f64 {
    2f64.powi(bits as i32 - 1) - 1.0
}

fn unsigned_normalization_factor(bits: u32) -> f64 {
    2f64.powi(bits as i32) - 1.0
}

fn read_unsigned(bytes: &[u8], endian: Endian) -> u64 {
    let mut v: u64 = 0;
    match endian {
        Endian::Little => {
            for (i, &b) in bytes.iter().enumerate() {
                v |= (b as u64) << (8 * i);
            }
        }
        Endian::Big => {
            for &b in bytes {
                v = (v << 8) | b as u64;
            }
        }
    }
    v
}

/// Sign-extend the low `bits` bits of `raw` to a full `i64`.
fn sign_extend(raw: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

/// Decode one interleaved PCM byte frame (`channels * bytes_per_sample`
/// bytes) into `f32` samples in `[-1, 1)` (signed) or `[0, 1)`
/// (unsigned). 24-bit values are sign-extended from the top bit before
/// normalization.
pub fn decode_pcm_frame(format: &AudioFormat, bytes: &[u8]) -> Result<Vec<f32>> {
    let bytes_per_sample = (format.sample_size_bits / 8) as usize;
    let channels = format.channels as usize;
    let expected = bytes_per_sample * channels;
    if bytes.len() != expected {
        return Err(Error::invariant(format!(
            "PCM frame has {} bytes, expected {expected}",
            bytes.len()
        )));
    }
    let mut samples = Vec::with_capacity(channels);
    for chunk in bytes.chunks_exact(bytes_per_sample) {
        let raw = read_unsigned(chunk, format.endian);
        let sample = match format.encoding {
            Encoding::PcmSigned => {
                let signed = sign_extend(raw, format.sample_size_bits);
                (signed as f64 / signed_normalization_factor(format.sample_size_bits)) as f32
            }
            Encoding::PcmUnsigned => {
                (raw as f64 / unsigned_normalization_factor(format.sample_size_bits)) as f32
            }
        };
        samples.push(sample);
    }
    Ok(samples)
}

/// An in-memory source over pre-built frames, used in tests and as the
/// simplest possible pump driver.
#[derive(Clone, Debug)]
pub struct VecSource {
    format: AudioFormat,
    frames: Vec<Frame>,
    position: usize,
}

impl VecSource {
    pub fn new(format: AudioFormat, frames: Vec<Frame>) -> Self {
        VecSource {
            format,
            frames,
            position: 0,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

impl SignalSource for VecSource {
    fn read(&mut self) -> Result<ReadOutcome> {
        if self.position >= self.frames.len() {
            return Ok(ReadOutcome::EndOfStream);
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(ReadOutcome::Frame(frame))
    }

    fn reset(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// A source over raw interleaved PCM bytes, decoding one frame per
/// `read()` call.
#[derive(Clone, Debug)]
pub struct PcmByteSource {
    format: AudioFormat,
    bytes: Vec<u8>,
    cursor: usize,
    frame_number: u64,
}

impl PcmByteSource {
    pub fn new(format: AudioFormat, bytes: Vec<u8>) -> Self {
        PcmByteSource {
            format,
            bytes,
            cursor: 0,
            frame_number: 0,
        }
    }
}

impl SignalSource for PcmByteSource {
    fn read(&mut self) -> Result<ReadOutcome> {
        let frame_bytes = self.format.frame_size_bytes as usize;
        if frame_bytes == 0 || self.cursor + frame_bytes > self.bytes.len() {
            return Ok(ReadOutcome::EndOfStream);
        }
        let chunk = &self.bytes[self.cursor..self.cursor + frame_bytes];
        let samples = decode_pcm_frame(&self.format, chunk)?;
        self.cursor += frame_bytes;
        let frame = Frame::real(self.format, self.frame_number, samples);
        self.frame_number += 1;
        Ok(ReadOutcome::Frame(frame))
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        self.frame_number = 0;
        Ok(())
    }
}

#[cfg(feature = "decode")]
pub mod decode {
    //! Bridge from a [`symphonia`]-decoded stream into the graph's
    //! [`SignalSource`] contract. Every decoded packet is split into one
    //! `Frame` per sample instant, since the runtime's unit of work is one
    //! multichannel instant, not one packet.

    use super::*;
    use std::collections::VecDeque;
    use std::fs::File;
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{Decoder, DecoderOptions};
    use symphonia::core::errors::Error as SymphoniaError;
    use symphonia::core::formats::{FormatOptions, FormatReader};
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    pub struct SymphoniaSource {
        format: AudioFormat,
        reader: Box<dyn FormatReader>,
        decoder: Box<dyn Decoder>,
        track_id: u32,
        pending: VecDeque<Vec<f32>>,
        frame_number: u64,
        path: std::path::PathBuf,
    }

    impl SymphoniaSource {
        pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self> {
            let path = path.into();
            let (reader, decoder, track_id, format) = Self::open_stream(&path)?;
            Ok(SymphoniaSource {
                format,
                reader,
                decoder,
                track_id,
                pending: VecDeque::new(),
                frame_number: 0,
                path,
            })
        }

        fn open_stream(
            path: &std::path::Path,
        ) -> Result<(Box<dyn FormatReader>, Box<dyn Decoder>, u32, AudioFormat)> {
            let file = File::open(path)?;
            let mss = MediaSourceStream::new(Box::new(file), Default::default());
            let mut hint = Hint::new();
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                hint.with_extension(ext);
            }
            let probed = symphonia::default::get_probe()
                .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
                .map_err(|e| Error::configuration(format!("unrecognized audio container: {e}")))?;
            let reader = probed.format;
            let track = reader
                .tracks()
                .iter()
                .find(|t| t.codec_params.sample_rate.is_some())
                .ok_or_else(|| Error::configuration("no decodable audio track found"))?;
            let track_id = track.id;
            let decoder = symphonia::default::get_codecs()
                .make(&track.codec_params, &DecoderOptions::default())
                .map_err(|e| Error::configuration(format!("unsupported codec: {e}")))?;
            let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100) as f64;
            let channels = track
                .codec_params
                .channels
                .map(|c| c.count() as u32)
                .unwrap_or(1);
            let format = AudioFormat::mono(sample_rate).with_channels(channels);
            Ok((reader, decoder, track_id, format))
        }

        pub fn format(&self) -> AudioFormat {
            self.format
        }

        fn fill_pending(&mut self) -> Result<bool> {
            loop {
                let packet = match self.reader.next_packet() {
                    Ok(packet) => packet,
                    Err(SymphoniaError::IoError(ref e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        return Ok(false);
                    }
                    Err(e) => return Err(Error::configuration(format!("demux error: {e}"))),
                };
                if packet.track_id() != self.track_id {
                    continue;
                }
                let decoded = match self.decoder.decode(&packet) {
                    Ok(decoded) => decoded,
                    Err(SymphoniaError::DecodeError(msg)) => {
                        log::warn!("skipping undecodable packet: {msg}");
                        continue;
                    }
                    Err(e) => return Err(Error::configuration(format!("decode error: {e}"))),
                };
                let spec = *decoded.spec();
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                let channels = spec.channels.count();
                for chunk in sample_buf.samples().chunks_exact(channels) {
                    self.pending.push_back(chunk.to_vec());
                }
                return Ok(true);
            }
        }
    }

    impl SignalSource for SymphoniaSource {
        fn read(&mut self) -> Result<ReadOutcome> {
            while self.pending.is_empty() {
                if !self.fill_pending()? {
                    return Ok(ReadOutcome::EndOfStream);
                }
            }
            let samples = self.pending.pop_front().expect("checked non-empty above");
            let frame = Frame::real(self.format, self.frame_number, samples);
            self.frame_number += 1;
            Ok(ReadOutcome::Frame(frame))
        }

        fn reset(&mut self) -> Result<()> {
            let (reader, decoder, track_id, format) = Self::open_stream(&self.path)?;
            self.reader = reader;
            self.decoder = decoder;
            self.track_id = track_id;
            self.format = format;
            self.pending.clear();
            self.frame_number = 0;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, Encoding, Endian};

    #[test]
    fn sixteen_bit_signed_round_trips_full_scale() {
        let format = AudioFormat::new(8000.0, 16, 1, Encoding::PcmSigned, Endian::Little);
        let bytes = (i16::MAX).to_le_bytes();
        let samples = decode_pcm_frame(&format, &bytes).unwrap();
        assert!((samples[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn sixteen_bit_signed_negative_full_scale_is_minus_one() {
        let format = AudioFormat::new(8000.0, 16, 1, Encoding::PcmSigned, Endian::Little);
        let bytes = (-32768i16).to_le_bytes();
        let samples = decode_pcm_frame(&format, &bytes).unwrap();
        assert!(samples[0] <= -1.0 && samples[0] > -1.01);
    }

    #[test]
    fn eight_bit_unsigned_midpoint_is_near_half() {
        let format = AudioFormat::new(8000.0, 8, 1, Encoding::PcmUnsigned, Endian::Little);
        let samples = decode_pcm_frame(&format, &[128]).unwrap();
        assert!((samples[0] - 128.0 / 255.0).abs() < 1e-4);
    }

    #[test]
    fn twenty_four_bit_signed_sign_extends() {
        let format = AudioFormat::new(8000.0, 24, 1, Encoding::PcmSigned, Endian::Little);
        // -1 in 24-bit two's complement: 0xFFFFFF.
        let samples = decode_pcm_frame(&format, &[0xFF, 0xFF, 0xFF]).unwrap();
        assert!((samples[0] + 1.0 / signed_normalization_factor(24) as f32).abs() < 1e-6);
    }

    #[test]
    fn wrong_byte_count_is_invariant_error() {
        let format = AudioFormat::new(8000.0, 16, 2, Encoding::PcmSigned, Endian::Little);
        let err = decode_pcm_frame(&format, &[0, 0]).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn vec_source_resets_to_start() {
        let fmt = AudioFormat::mono(8000.0);
        let mut source = VecSource::new(fmt, vec![Frame::real(fmt, 0, vec![1.0])]);
        assert!(matches!(source.read().unwrap(), ReadOutcome::Frame(_)));
        assert!(matches!(source.read().unwrap(), ReadOutcome::EndOfStream));
        source.reset().unwrap();
        assert!(matches!(source.read().unwrap(), ReadOutcome::Frame(_)));
    }
}
