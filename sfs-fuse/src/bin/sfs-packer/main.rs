mod cli;

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;

use clap::Parser;
use cli::Cli;
use sfs::FileOps;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("source={:?}\nout={:?}", cli.source, cli.out);

    let mut sfs = sfs_fuse::create_image(&cli.out)?;

    let names = fs::read_dir(&cli.source)?
        .map(|entry| {
            entry.map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .expect("source file name is not UTF-8")
                    .to_owned()
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for name in names {
        println!("packing: {name:?}");
        let mut host_file = File::open(cli.source.join(&name))?;
        let mut data: Vec<u8> = Vec::new();
        host_file.read_to_end(&mut data)?;

        let fd = sfs.open(&name).unwrap();
        let written = sfs.write(fd, &data);
        assert_eq!(written, data.len(), "image ran out of space");
        sfs.close(fd).unwrap();
    }

    Ok(())
}
