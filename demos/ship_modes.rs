//! Ship-mode selection example for the vecbase library.
//!
//! Run with `RUST_LOG=vecbase=trace` to see the build events.

use tracing_subscriber::EnvFilter;
use vecbase::utils::metrics;
use vecbase::{
    BinaryOptions, Column, Columnar, FixedStringColumn, FlatBinaryColumn, InlineBinaryColumn,
    Operator, Slice,
};

const SHIP_MODES: [&str; 7] = ["TRUCK", "AIR", "RAIL", "MAIL", "REG AIR", "SHIP", "FOB"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("vecbase Ship Mode Example");
    println!("=========================");
    println!("SIMD equality kernel: {}", vecbase::has_simd_support());

    // Build a small lineitem-like table: one string column, two numeric ones.
    let rows = 10_000;
    let modes: Vec<&str> = (0..rows).map(|i| SHIP_MODES[(i * 5 + i / 7) % 7]).collect();
    let quantity: Column<i32> = (0..rows).map(|i| (i % 50) as i32 + 1).collect();
    let price: Column<f64> = (0..rows).map(|i| 900.0 + (i % 200) as f64 * 1.25).collect();

    let mut flat = FlatBinaryColumn::with_options(BinaryOptions::new().spare_rows(16))?;
    flat.build_strings(&modes)?;
    let inline = InlineBinaryColumn::from_strings(&modes)?;

    println!("\nLayouts:");
    println!("  flat arena:   {} bytes", flat.arena_len());
    println!("  inline arena: {} bytes", inline.arena_len());
    println!("  first row:    {:?}", flat.get_slice(0));
    println!("  last row:     {:?}", inline.get_slice(rows - 1));

    // WHERE l_shipmode IN ('MAIL', 'SHIP') AND l_quantity < 24
    let mail = flat.compare_scalar(Operator::Eq, Slice::from("MAIL"));
    let ship = inline.compare_scalar(Operator::Eq, Slice::from("SHIP"));
    let either = mail.zip_with(&ship, |a, b| a | b);
    let small = quantity.compare_scalar(Operator::Lt, 24);
    let selector = either.zip_with(&small, |a, b| a & b);

    let revenue = &price * &quantity.transform(|q| q as f64);
    let selected = revenue.filter(&selector);
    let total: f64 = selected.iter().sum();

    println!("\nSelection:");
    println!("  rows selected: {} of {}", selector.count_true(), rows);
    println!("  revenue:       {:.2}", total);

    // Group the selected rows by ship mode.
    let selected_modes = flat.filter(&selector);
    for mode in ["MAIL", "SHIP"] {
        let count = selected_modes
            .compare_scalar(Operator::Eq, Slice::from(mode))
            .count_true();
        println!("  {:<5} {}", mode, count);
    }

    // The same codes as fixed-width cells.
    let mut codes = FixedStringColumn::new(8);
    for mode in SHIP_MODES {
        codes.push(mode);
    }
    let lengths = codes.transform(|code| code.len() as u32);
    println!("\nFixed-width codes: {:?}", codes);
    println!("  lengths: {:?}", lengths);

    let stats = metrics::get_stats();
    println!("\nMemory statistics:");
    println!("  allocations:   {}", stats.alloc_count);
    println!("  reallocations: {}", stats.realloc_count);
    println!("  bytes:         {}", stats.bytes_allocated);
    println!("  builds:        {} (avg {} us)", stats.build_count, stats.avg_build_time_us);
    println!("  filters:       {} (avg {} us)", stats.filter_count, stats.avg_filter_time_us);

    Ok(())
}
