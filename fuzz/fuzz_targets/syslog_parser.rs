#![no_main]

use lognorm_engine::{Mode, SysLog};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    // 크래시나 패닉 없이 true 또는 false를 반환해야 한다
    let mut native = SysLog::new().with_mode(Mode::Native);
    let mut regexp = SysLog::new().with_mode(Mode::Regexp);
    let parsed = native.parse(line);

    // 두 추출 방식은 같은 결과를 내야 한다
    assert_eq!(parsed, regexp.parse(line));
    assert_eq!(native.dump(), regexp.dump());

    // 출력과 재파싱도 패닉이 없어야 한다
    if parsed {
        let mut again = SysLog::new();
        let _ = again.parse(&native.syslog());
    }
});
