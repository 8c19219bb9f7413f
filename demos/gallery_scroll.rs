// Gallery scroll walkthrough for thumbcache
//
// Run with: RUST_LOG=debug cargo run --example gallery_scroll

use std::sync::{Arc, Mutex};
use thumbcache::{
    CacheBoundView, CacheEvent, CacheScope, LoadTicket, ResourceCache, ViewOptions, ViewSlot,
};

/// Stand-in for a decoded bitmap
#[derive(Debug)]
struct Bitmap {
    width: u32,
    height: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Loads finish when the "network" below says so
    let in_flight: Arc<Mutex<Vec<LoadTicket>>> = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::clone(&in_flight);

    let cache = ResourceCache::builder()
        .page_size(8)
        .prefetch_count(3)
        .with_loader(move |ticket: LoadTicket| {
            queue.lock().unwrap().push(ticket);
        })
        .on_event(|event| match event {
            CacheEvent::Evicted {
                locator,
                was_pending,
            } => println!("  evicted {locator} (pending: {was_pending})"),
            CacheEvent::Cleared { removed } => println!("  cleared {removed} resources"),
            _ => {}
        })
        .build_shared()?;

    let scope = CacheScope::enter(Arc::clone(&cache));
    let view = scope.view();
    let locator = |n: usize| format!("https://photos.example/{n}.jpg");

    println!("=== Page 1 ===");
    let mut grid: Vec<ViewSlot> = (0..8).map(|_| ViewSlot::new()).collect();
    bind_page(&view, &mut grid, 0, &locator);
    deliver(&in_flight);

    println!("=== Full-screen preview of photo 3 ===");
    let mut preview = ViewSlot::new();
    let shown = view.bind(
        &locator(3),
        &mut preview,
        &ViewOptions::new().class_name("fullscreen").on_ready(|handle| {
            if let Some(bitmap) = handle.payload::<Bitmap>() {
                println!("  preview ready: {}x{}", bitmap.width, bitmap.height);
            }
        }),
    );
    println!("  thumbnail still holding: {}", grid[3].is_holding());
    if let Some(shown) = shown {
        println!("  preview holding {} ({:?})", shown.locator(), shown.readiness());
    }
    view.unbind(&mut preview);

    println!("=== Page 2 ===");
    bind_page(&view, &mut grid, 8, &locator);
    deliver(&in_flight);

    println!("=== Back to page 1 ===");
    bind_page(&view, &mut grid, 0, &locator);
    deliver(&in_flight);

    let stats = cache.stats();
    println!(
        "{} of {} cached, hit rate {:.0}%, {} evictions",
        stats.entry_count,
        stats.capacity,
        stats.hit_rate() * 100.0,
        stats.evictions
    );

    drop(grid);
    scope.exit();
    Ok(())
}

fn bind_page(
    view: &CacheBoundView,
    grid: &mut [ViewSlot],
    first: usize,
    locator: &dyn Fn(usize) -> String,
) {
    for (offset, slot) in grid.iter_mut().enumerate() {
        let options = ViewOptions::new()
            .class_name("thumb")
            .alt_text(format!("Photo {}", first + offset));
        view.bind(&locator(first + offset), slot, &options);
    }
}

fn deliver(in_flight: &Mutex<Vec<LoadTicket>>) {
    let tickets: Vec<LoadTicket> = in_flight.lock().unwrap().drain(..).collect();
    for ticket in tickets {
        if ticket.is_cancelled() {
            println!("  skipping {}", ticket.locator());
            continue;
        }
        println!("  loaded {}", ticket.locator());
        ticket.complete(Bitmap {
            width: 1920,
            height: 1080,
        });
    }
}
