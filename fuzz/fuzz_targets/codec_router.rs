#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lognorm_core::Format;
use lognorm_engine::CodecRouter;

#[derive(Arbitrary, Debug)]
enum FuzzFormat {
    Json,
    Yaml,
    Csv,
    Syslog,
}

impl FuzzFormat {
    fn format(&self) -> Format {
        match self {
            FuzzFormat::Json => Format::Json,
            FuzzFormat::Yaml => Format::Yaml,
            FuzzFormat::Csv => Format::Csv,
            FuzzFormat::Syslog => Format::Syslog,
        }
    }
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    from: FuzzFormat,
    to: FuzzFormat,
    text: String,
}

fuzz_target!(|input: FuzzInput| {
    let router = CodecRouter::with_defaults();

    // 변환은 Ok 또는 Err을 반환해야 하며 패닉이 없어야 한다
    let _ = router.convert(&input.text, input.from.format(), input.to.format());
});
