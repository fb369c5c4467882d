//! Build a small portrait bundle in memory and print it as txtar

use portrait_bundle::{export, Bundle, Category, LogObserver, PortraitSet, SequentialIdGenerator};

fn main() -> anyhow::Result<()> {
    println!("=== Portrait Bundle Example ===\n");

    let mut ids = SequentialIdGenerator::new("demo");
    let mut set = PortraitSet::new();

    // Simulated DDS header standing in for an uploaded image
    let image = vec![0x44, 0x44, 0x53, 0x20, 0x7C, 0x00, 0x00, 0x00];

    for category in [Category::Human, Category::Lithoid] {
        let id = set.create(&mut ids)?;
        set.set_category(&id, category)?;
        set.attach_payload(&id, &image)?;
    }

    for line in set.summary_lines() {
        println!("{}", line);
    }

    let entries = export(set.records(), &mut LogObserver)?;
    let bundle = Bundle::from_entries(entries)?;

    println!("\nBundle ({} files):", bundle.len());
    println!("---");
    print!("{}", bundle.encode());
    println!("---");

    Ok(())
}
