use crate::pipeline::CompressionVariant;

// audio stream parameters fixed by the sender
pub const AUDIO_CHANNELS: i32 = 2;
pub const AUDIO_SAMPLE_RATE: i32 = 44_100;

// input stage names
pub const VIDEO_SRC_NAME: &str = "h264-src";
pub const ALAC_SRC_NAME: &str = "alac-src";
pub const AAC_ELD_SRC_NAME: &str = "aac-eld-src";

pub const VIDEO_CAPS: &str =
    "video/x-h264,colorimetry=bt709,stream-format=(string)byte-stream,alignment=(string)au";

/// ALAC magic cookie: 352 samples per frame, 16 bit, 2 channels, 44100 Hz.
pub const ALAC_CODEC_DATA: [u8; 36] = [
    0x00, 0x00, 0x00, 0x24, 0x61, 0x6c, 0x61, 0x63, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    0x60, 0x00, 0x10, 0x28, 0x0a, 0x0e, 0x02, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xac, 0x44,
];

/// AAC-ELD AudioSpecificConfig: object type 39, 44100 Hz, 2 channels.
pub const AAC_ELD_CODEC_DATA: [u8; 4] = [0xf8, 0xe8, 0x50, 0x00];

pub const SEEK_NANOS_PER_SECOND: f64 = 1_000_000_000.0;

// engine defaults
pub const DEFAULT_AUDIO_SINK: &str = "autoaudiosink";
pub const DEFAULT_PLAYLIST_ELEMENT: &str = "playbin3";
pub const DEFAULT_DEBUG_LEVEL: &str = "3";
pub const MIN_ENGINE_VERSION: (u32, u32) = (1, 10);

#[cfg(target_os = "windows")]
pub const TARGET_OS: &str = "windows";
#[cfg(target_os = "macos")]
pub const TARGET_OS: &str = "macos";
#[cfg(target_os = "linux")]
pub const TARGET_OS: &str = "linux";
#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
pub const TARGET_OS: &str = "other";

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decoder configuration blob for `variant`
pub fn codec_data(variant: CompressionVariant) -> &'static [u8] {
    match variant {
        CompressionVariant::Alac => &ALAC_CODEC_DATA,
        CompressionVariant::AacEld => &AAC_ELD_CODEC_DATA,
    }
}

/// Input caps for the audio pipeline of `variant`
pub fn audio_caps(variant: CompressionVariant) -> String {
    let media_type = match variant {
        CompressionVariant::Alac => "audio/x-alac",
        CompressionVariant::AacEld => "audio/mpeg",
    };
    format!(
        "{},mpegversion=(int)4,channels=(int){},rate=(int){},stream-format=raw,codec_data=(buffer){}",
        media_type,
        AUDIO_CHANNELS,
        AUDIO_SAMPLE_RATE,
        hex(codec_data(variant))
    )
}

pub fn audio_src_name(variant: CompressionVariant) -> &'static str {
    match variant {
        CompressionVariant::Alac => ALAC_SRC_NAME,
        CompressionVariant::AacEld => AAC_ELD_SRC_NAME,
    }
}

pub fn audio_decoder(variant: CompressionVariant) -> &'static str {
    match variant {
        CompressionVariant::Alac => "avdec_alac",
        CompressionVariant::AacEld => "avdec_aac",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_caps_are_bit_exact() {
        assert_eq!(
            audio_caps(CompressionVariant::Alac),
            "audio/x-alac,mpegversion=(int)4,channels=(int)2,rate=(int)44100,stream-format=raw,codec_data=(buffer)00000024616c616300000000000001600010280a0e0200ff00000000000000000000ac44"
        );
        assert_eq!(
            audio_caps(CompressionVariant::AacEld),
            "audio/mpeg,mpegversion=(int)4,channels=(int)2,rate=(int)44100,stream-format=raw,codec_data=(buffer)f8e85000"
        );
    }

    #[test]
    fn test_alac_cookie_fields() {
        let cookie = &ALAC_CODEC_DATA;
        let be32 = |at: usize| u32::from_be_bytes([cookie[at], cookie[at + 1], cookie[at + 2], cookie[at + 3]]);

        assert_eq!(be32(0) as usize, cookie.len());
        assert_eq!(&cookie[4..8], b"alac");
        assert_eq!(be32(12), 352); // frame length
        assert_eq!(cookie[17], 16); // bit depth
        assert_eq!(cookie[21] as i32, AUDIO_CHANNELS);
        assert_eq!(be32(32) as i32, AUDIO_SAMPLE_RATE);
    }

    #[test]
    fn test_aac_eld_audio_specific_config() {
        let bits = u32::from_be_bytes(AAC_ELD_CODEC_DATA);
        let object_type = bits >> 27;
        let extended_type = (bits >> 21) & 0x3f;
        let frequency_index = (bits >> 17) & 0x0f;
        let channel_config = (bits >> 13) & 0x0f;

        assert_eq!(object_type, 31); // escape
        assert_eq!(32 + extended_type, 39); // ER AAC ELD
        assert_eq!(frequency_index, 4); // 44100 Hz
        assert_eq!(channel_config as i32, AUDIO_CHANNELS);
    }
}
