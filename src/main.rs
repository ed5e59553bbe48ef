//! Pixel Ripple demo
//!
//! The effect itself ships as a wasm library (`trunk`/`wasm-pack` build).
//! Natively this previews a ripple in the terminal using the headless host.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use pixel_ripple::RippleOptions;
    use pixel_ripple::host::HeadlessHost;

    env_logger::init();

    // Optional: timing function name, e.g. `pixel-ripple easeOutQuad`
    let timing = std::env::args().nth(1);
    log::info!("Pixel Ripple (native) preview, timing: {:?}", timing);

    let (width, height) = (48u32, 20u32);
    let host = HeadlessHost::new(0x5eed);
    let options = RippleOptions {
        pixel_size: Some(2),
        color: Some("black".to_string()),
        timing_function: timing,
        ..Default::default()
    };

    let handle = match pixel_ripple::ripple::play(&host, 12.0, 8.0, width, height, &options) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("Could not start ripple: {}", e);
            return;
        }
    };

    while host.run_frame() > 0 {
        let frame = handle.surface().snapshot();
        println!("frame {}", handle.frame());
        for y in 0..frame.height() {
            let row: String = (0..frame.width())
                .map(|x| match frame.pixel(x, y) {
                    Some(p) if p.a > 0 => '#',
                    _ => '.',
                })
                .collect();
            println!("{}", row);
        }
        println!();
    }

    println!("✓ Revealed in {} frames", host.frame_count());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}
