//! # Header Dump
//!
//! **What this example teaches:**
//! - Sniffing a file before parsing it
//! - Walking the operating-system headers and the section table
//! - Following the CLR runtime header to the metadata root and table stream
//! - Translating addresses between RVAs and file offsets
//!
//! ```bash
//! cargo run --example dump_headers -- path/to/assembly.dll
//! ```

use clrpe::prelude::*;
use std::{env, path::Path};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-pe-image>", args[0]);
        return Ok(());
    }

    let path = Path::new(&args[1]);
    if !PeFileInfo::is_pe_file_with(path, &ReaderConfig::new().without_extension_check()) {
        eprintln!("{} is not a PE image", path.display());
        return Ok(());
    }

    let headers = ModuleHeaders::from_file(path)?;
    let os = headers.os_headers();
    let coff = os.coff_header();
    let pe = os.pe_header();

    println!("{}", path.display());
    println!(
        "  PE header at      0x{:X}",
        os.ms_dos_stub().pe_header_offset
    );
    println!(
        "  machine           {} (0x{:04X})",
        coff.machine_name, coff.machine_raw
    );
    println!("  characteristics   {:?}", coff.characteristics_flags());
    println!("  format            {:?}", pe.format);
    println!("  image base        0x{:X}", pe.image_base);
    println!("  subsystem         {:?}", pe.subsystem());
    println!("  entry point       0x{:08X}", pe.address_of_entry_point);

    println!();
    println!("Data directories:");
    for dir in pe.data_directories.iter().filter(|dir| dir.is_present()) {
        println!(
            "  {:<24} rva 0x{:08X} size 0x{:X}",
            dir.name, dir.rva, dir.size
        );
    }

    println!();
    println!("Sections:");
    for section in os.section_headers() {
        println!(
            "  {:<8} va 0x{:08X} vsize 0x{:<6X} raw 0x{:08X} rawsize 0x{:X}",
            section.name, section.virtual_address, section.virtual_size,
            section.pointer_to_raw_data, section.size_of_raw_data
        );
    }

    if pe.address_of_entry_point != 0 {
        match headers.rva_to_offset(pe.address_of_entry_point) {
            Ok(offset) => println!("\nEntry point at file offset 0x{offset:X}"),
            Err(error) => println!("\nEntry point not in any section: {error}"),
        }
    }

    let Some(cor20) = headers.cor20_header() else {
        println!("\nNo CLR header; native image.");
        return Ok(());
    };

    println!();
    println!(
        "CLR runtime {}.{}, flags {:?}",
        cor20.major_runtime_version,
        cor20.minor_runtime_version,
        cor20.flags_bits()
    );

    if let Some(metadata) = headers.metadata_headers() {
        let root = metadata.storage_sig_and_header();
        println!(
            "Metadata version {:?}, {} streams",
            root.version, root.stream_count
        );
        for stream in metadata.stream_headers() {
            println!(
                "  {:<10} offset 0x{:X} size 0x{:X} ({:?})",
                stream.name, stream.offset, stream.size, stream.stream_type
            );
        }
    }

    if let Some(tables) = headers.table_header() {
        println!();
        println!(
            "Table stream {}.{}, heap sizes {:?}, {} tables",
            tables.major_version,
            tables.minor_version,
            tables.heap_sizes(),
            tables.table_count()
        );
        for table in tables.present_tables() {
            println!(
                "  {:<24} {} rows",
                format!("{table:?}"),
                tables.row_count(table)
            );
        }
    }

    Ok(())
}
