use audiopipe_core::SampleFormat;
use audiopipe_graph::Arg;

pub fn find<'a>(args: &'a [Arg], key: &str) -> Option<&'a str> {
    args.iter().find(|a| a.key == key).map(|a| a.value.as_str())
}

pub fn parse_sample_format(s: &str) -> Option<SampleFormat> {
    Some(match s {
        "u8" => SampleFormat::U8,
        "s16" => SampleFormat::S16,
        "s32" => SampleFormat::S32,
        "float" | "f32" => SampleFormat::Float32,
        "double" | "f64" => SampleFormat::Float64,
        _ => return None,
    })
}

pub fn parse_f32(s: &str) -> Option<f32> {
    s.parse().ok()
}

pub fn parse_f64(s: &str) -> Option<f64> {
    s.parse().ok()
}

pub fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}
