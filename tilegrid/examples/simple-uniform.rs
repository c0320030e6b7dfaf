use tilegrid::GridPacker;

fn main() {
    env_logger::init();

    let packer = GridPacker::new().max_width(1024);
    let layout = packer.pack((256, 320), 12).expect("nothing to pack");

    println!("Layout: {:#?}", layout);

    for placement in layout.placements(12) {
        println!(
            "tile {:>2} -> row {} column {} at {:?}",
            placement.index, placement.row, placement.column, placement.rect.pos
        );
    }
}
