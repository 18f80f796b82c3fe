//! Minimal synthetic images for the integration tests.
//!
//! Images are zero-filled buffers with the relevant fields patched in place. The PE signature is
//! always at 0x80 and the optional header at 0x98.

#![allow(dead_code)]

use std::{io::Write, path::PathBuf};

const OPTIONAL_HEADER: usize = 0x98;

fn put_u16(image: &mut [u8], offset: usize, value: u16) {
    image[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(image: &mut [u8], offset: usize, value: u64) {
    image[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// `(name, virtual_address, virtual_size, size_of_raw_data, pointer_to_raw_data)`
pub type Section<'a> = (&'a str, u32, u32, u32, u32);

/// Build an image with a 16-entry data directory table.
///
/// `clr` is written into data directory 14.
pub fn image(pe32_plus: bool, sections: &[Section], clr: (u32, u32), len: usize) -> Vec<u8> {
    let optional_size: usize = if pe32_plus { 240 } else { 224 };
    let section_table = OPTIONAL_HEADER + optional_size;
    let mut image = vec![0u8; len.max(section_table + sections.len() * 40)];

    image[0..2].copy_from_slice(b"MZ");
    put_u32(&mut image, 0x3C, 0x80); // e_lfanew
    image[0x80..0x84].copy_from_slice(b"PE\0\0");

    let machine: u16 = if pe32_plus { 0x8664 } else { 0x014C };
    put_u16(&mut image, 0x84, machine); // Machine
    put_u16(&mut image, 0x86, sections.len() as u16); // NumberOfSections
    put_u16(&mut image, 0x94, optional_size as u16); // SizeOfOptionalHeader
    put_u16(&mut image, 0x96, 0x0022); // Characteristics

    let (magic, rva_count, directories): (u16, usize, usize) = if pe32_plus {
        (0x20B, 108, 112)
    } else {
        (0x10B, 92, 96)
    };
    put_u16(&mut image, OPTIONAL_HEADER, magic);
    if pe32_plus {
        put_u64(&mut image, OPTIONAL_HEADER + 24, 0x0001_4000_0000); // ImageBase
    } else {
        put_u32(&mut image, OPTIONAL_HEADER + 28, 0x0040_0000); // ImageBase
    }
    put_u32(&mut image, OPTIONAL_HEADER + rva_count, 16); // NumberOfRvaAndSizes
    let clr_directory = OPTIONAL_HEADER + directories + 14 * 8;
    put_u32(&mut image, clr_directory, clr.0);
    put_u32(&mut image, clr_directory + 4, clr.1);

    for (index, (name, va, vsize, raw_size, raw_ptr)) in sections.iter().enumerate() {
        let header = section_table + index * 40;
        image[header..header + name.len()].copy_from_slice(name.as_bytes());
        put_u32(&mut image, header + 8, *vsize);
        put_u32(&mut image, header + 12, *va);
        put_u32(&mut image, header + 16, *raw_size);
        put_u32(&mut image, header + 20, *raw_ptr);
        put_u32(&mut image, header + 36, 0x6000_0020);
    }

    image
}

/// The AMD64 image with a single `.text` section at RVA 0x2000 / file offset 0x400.
pub fn native_image() -> Vec<u8> {
    let text = (".text", 0x2000, 0x100, 0x200, 0x400);
    image(true, &[text], (0, 0), 0x600)
}

/// A PE32 .NET image: Cor20 header at RVA 0x2000 (file 0x200), metadata root at RVA 0x2048
/// (file 0x248) with `#~` and `#Strings` streams, and a table stream listing Module (1 row) and
/// TypeDef (3 rows).
pub fn managed_image() -> Vec<u8> {
    let text = (".text", 0x2000, 0x200, 0x200, 0x200);
    let mut image = image(false, &[text], (0x2000, 72), 0x400);

    let cor20 = 0x200;
    put_u32(&mut image, cor20, 72); // cb
    put_u16(&mut image, cor20 + 4, 2); // MajorRuntimeVersion
    put_u16(&mut image, cor20 + 6, 5); // MinorRuntimeVersion
    put_u32(&mut image, cor20 + 8, 0x2048); // MetaData RVA
    put_u32(&mut image, cor20 + 12, 0x80); // MetaData size
    put_u32(&mut image, cor20 + 16, 0x0000_0001); // Flags: ILONLY

    let root = 0x248;
    put_u32(&mut image, root, 0x424A_5342); // BSJB
    put_u16(&mut image, root + 4, 1);
    put_u16(&mut image, root + 6, 1);
    put_u32(&mut image, root + 12, 12); // version length
    image[root + 16..root + 26].copy_from_slice(b"v4.0.30319");
    put_u16(&mut image, root + 30, 2); // stream count

    put_u32(&mut image, root + 32, 0x40); // #~ offset
    put_u32(&mut image, root + 36, 0x20); // #~ size
    image[root + 40..root + 42].copy_from_slice(b"#~");
    put_u32(&mut image, root + 44, 0x60); // #Strings offset
    put_u32(&mut image, root + 48, 0x10); // #Strings size
    image[root + 52..root + 60].copy_from_slice(b"#Strings");

    let tables = root + 0x40;
    image[tables + 4] = 2; // MajorVersion
    image[tables + 7] = 1; // Reserved
    put_u64(&mut image, tables + 8, 0b101); // Valid: Module, TypeDef
    put_u32(&mut image, tables + 24, 1);
    put_u32(&mut image, tables + 28, 3);

    image
}

/// Write `data` to `name` inside `dir`.
pub fn write(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create test image");
    file.write_all(data).expect("write test image");
    path
}
