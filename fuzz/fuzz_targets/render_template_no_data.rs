#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = whisker::render_template(data, &Vec::<u32>::new());
});
