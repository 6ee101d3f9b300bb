use std::env;

/// Spreads the bits of `byte` to the even positions of a 16-bit result.
fn expand(byte: u32) -> u32 {
    (0..8).fold(0, |acc, k| acc | ((byte >> k) & 1) << (2 * k))
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let per_line: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(8);

    eprintln!("Generating bit expand table:");
    eprintln!("  ENTRIES: 256");
    eprintln!("  PER_LINE: {}", per_line);
    eprintln!();

    println!("// Generated by table_generators/src/bin/generate_expand_table.rs");
    println!();
    println!("/// `EXPAND[x]` places bit `k` of `x` at bit `2 * k`, leaving every odd bit clear.");
    print!("pub const EXPAND: [u32; 256] = [");

    let table: Vec<u32> = (0..256).map(expand).collect();

    for (i, entry) in table.iter().enumerate() {
        if i % per_line == 0 {
            println!();
            print!("   ");
        }
        print!(" {:#010x},", entry);
    }

    println!();
    println!("];");

    let odd_bits_clear = table.iter().all(|entry| entry & 0xaaaa_aaaa == 0);
    let mut sorted = table.clone();
    sorted.sort_unstable();
    sorted.dedup();

    eprintln!();
    eprintln!("Sanity checks:");
    eprintln!("  EXPAND[0x01]: {:#06x} (expected: 0x0001)", table[0x01]);
    eprintln!("  EXPAND[0x80]: {:#06x} (expected: 0x4000)", table[0x80]);
    eprintln!("  EXPAND[0xff]: {:#06x} (expected: 0x5555)", table[0xff]);
    eprintln!("  Odd bits clear: {} (expected: true)", odd_bits_clear);
    eprintln!("  Distinct entries: {} (expected: 256)", sorted.len());
}
