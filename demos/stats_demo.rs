use clap::Parser;
use trihash::hash_table::Entry;
use trihash::hash_table::HashTable;
use trihash::HashUint;
use trihash::TableKey;

#[derive(Parser, Debug)]
struct Args {
    /// Number of entries to insert.
    #[arg(short = 'c', long = "count", default_value_t = 10_000)]
    count: u64,

    /// Delete every n-th entry afterwards to leave tombstones behind.
    #[arg(short = 'd', long = "delete-every", default_value_t = 3)]
    delete_every: u64,
}

fn hash(key: &u64) -> HashUint {
    TableKey::hash(key)
}

fn spread(i: u64) -> u64 {
    i.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn main() {
    let args = Args::parse();

    let mut table: HashTable<u64, u64> = HashTable::new();

    println!("inserting {} entries...", args.count);
    for i in 0..args.count {
        let key = spread(i);
        match table
            .entry(hash(&key), |k| *k == key, hash)
            .expect("allocation failed")
        {
            Entry::Vacant(entry) => {
                entry.insert(key, i);
            }
            Entry::Occupied(_) => panic!("key already present: {key}"),
        }
    }

    if args.delete_every > 0 {
        println!("deleting every {}-th entry...", args.delete_every);
        for i in (0..args.count).step_by(args.delete_every as usize) {
            let key = spread(i);
            table.delete(table.get(hash(&key), |k| *k == key));
        }
    }

    table.debug_stats().print();
    table.probe_histogram(hash).print();
}
