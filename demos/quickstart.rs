use std::io::{self, prelude::*};

use env_logger;
use log;

use ext_line_sort::{ExternalSorter, ExternalSorterBuilder, LimitedBufferBuilder};

fn main() {
    env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();

    let sources: Vec<&[u8]> = vec![&b"delta\nalpha\n"[..], &b"charlie\nbravo\n"[..], &b"echo"[..]];
    let mut output = Vec::new();

    let sorter: ExternalSorter = ExternalSorterBuilder::new()
        .with_buffer(LimitedBufferBuilder::new(1024, false))
        .build();

    let summary = sorter.sort(sources, &mut output).unwrap();

    io::stdout().write_all(&output).unwrap();
    println!("{:?}", summary);
}
