//! Synthetic image builders shared by the unit tests.
//!
//! Images are laid out like a small linker output: DOS header with `e_lfanew = 0x80`, PE
//! signature at 0x80, COFF header at 0x84, optional header at 0x98, then the section table and
//! the raw data of every section at its `pointer_to_raw_data`.

/// File offset of the PE signature in every built image
pub const PE_OFFSET: usize = 0x80;

/// RVA of the `.text` section of [`managed_image`]
pub const MANAGED_TEXT_RVA: u32 = 0x2000;
/// File offset of the `.text` section of [`managed_image`]
pub const MANAGED_TEXT_RAW: u32 = 0x200;
/// RVA of the Cor20 header of [`managed_image`]
pub const MANAGED_CLR_RVA: u32 = MANAGED_TEXT_RVA + 0x08;
/// RVA of the metadata root of [`managed_image`]
pub const MANAGED_METADATA_RVA: u32 = MANAGED_TEXT_RVA + 0x50;

/// Optional header of the given layout declaring `dir_count` empty data directories.
pub fn optional_header_pe32(dir_count: usize) -> Vec<u8> {
    optional_header(false, &vec![(0, 0); dir_count])
}

/// PE32+ counterpart of [`optional_header_pe32`].
pub fn optional_header_pe32_plus(dir_count: usize) -> Vec<u8> {
    optional_header(true, &vec![(0, 0); dir_count])
}

fn optional_header(pe32_plus: bool, directories: &[(u32, u32)]) -> Vec<u8> {
    let mut header = Vec::new();

    let push_address = |header: &mut Vec<u8>, value: u64| {
        if pe32_plus {
            header.extend_from_slice(&value.to_le_bytes());
        } else {
            header.extend_from_slice(&(value as u32).to_le_bytes());
        }
    };

    let magic: u16 = if pe32_plus { 0x20B } else { 0x10B };
    header.extend_from_slice(&magic.to_le_bytes()); // Magic
    header.push(0x0E); // MajorLinkerVersion
    header.push(0x1D); // MinorLinkerVersion
    header.extend_from_slice(&0x1000u32.to_le_bytes()); // SizeOfCode
    header.extend_from_slice(&0x0800u32.to_le_bytes()); // SizeOfInitializedData
    header.extend_from_slice(&0u32.to_le_bytes()); // SizeOfUninitializedData
    header.extend_from_slice(&0x1234u32.to_le_bytes()); // AddressOfEntryPoint
    header.extend_from_slice(&0x1000u32.to_le_bytes()); // BaseOfCode
    if !pe32_plus {
        header.extend_from_slice(&0x2000u32.to_le_bytes()); // BaseOfData
    }

    let image_base = if pe32_plus { 0x0001_4000_0000 } else { 0x0040_0000 };
    push_address(&mut header, image_base); // ImageBase
    header.extend_from_slice(&0x1000u32.to_le_bytes()); // SectionAlignment
    header.extend_from_slice(&0x200u32.to_le_bytes()); // FileAlignment
    header.extend_from_slice(&6u16.to_le_bytes()); // MajorOperatingSystemVersion
    header.extend_from_slice(&0u16.to_le_bytes()); // MinorOperatingSystemVersion
    header.extend_from_slice(&0u16.to_le_bytes()); // MajorImageVersion
    header.extend_from_slice(&0u16.to_le_bytes()); // MinorImageVersion
    header.extend_from_slice(&6u16.to_le_bytes()); // MajorSubsystemVersion
    header.extend_from_slice(&0u16.to_le_bytes()); // MinorSubsystemVersion
    header.extend_from_slice(&0u32.to_le_bytes()); // Win32VersionValue
    header.extend_from_slice(&0x4000u32.to_le_bytes()); // SizeOfImage
    header.extend_from_slice(&0x200u32.to_le_bytes()); // SizeOfHeaders
    header.extend_from_slice(&0u32.to_le_bytes()); // CheckSum

    let subsystem: u16 = if pe32_plus { 2 } else { 3 };
    header.extend_from_slice(&subsystem.to_le_bytes()); // Subsystem: GUI / console
    // DllCharacteristics: DYNAMIC_BASE | NX_COMPAT | TERMINAL_SERVER_AWARE
    header.extend_from_slice(&0x8160u16.to_le_bytes());

    if pe32_plus {
        push_address(&mut header, 0x0000_0001_0010_0000); // SizeOfStackReserve
        push_address(&mut header, 0x2000); // SizeOfStackCommit
        push_address(&mut header, 0x0000_0002_0010_0000); // SizeOfHeapReserve
        push_address(&mut header, 0x3000); // SizeOfHeapCommit
    } else {
        push_address(&mut header, 0x0010_0000); // SizeOfStackReserve
        push_address(&mut header, 0x1000); // SizeOfStackCommit
        push_address(&mut header, 0x0010_0000); // SizeOfHeapReserve
        push_address(&mut header, 0x1000); // SizeOfHeapCommit
    }

    header.extend_from_slice(&0u32.to_le_bytes()); // LoaderFlags
    header.extend_from_slice(&(directories.len() as u32).to_le_bytes()); // NumberOfRvaAndSizes
    for (rva, size) in directories {
        header.extend_from_slice(&rva.to_le_bytes());
        header.extend_from_slice(&size.to_le_bytes());
    }

    header
}

/// One section of a [`PeBuilder`] image.
#[derive(Clone)]
pub struct TestSection {
    name: [u8; 8],
    virtual_address: u32,
    virtual_size: u32,
    size_of_raw_data: u32,
    pointer_to_raw_data: u32,
    characteristics: u32,
    data: Vec<u8>,
}

impl TestSection {
    pub fn new(
        name: &str,
        virtual_address: u32,
        virtual_size: u32,
        size_of_raw_data: u32,
        pointer_to_raw_data: u32,
    ) -> TestSection {
        let mut raw_name = [0u8; 8];
        let len = name.len().min(8);
        raw_name[..len].copy_from_slice(&name.as_bytes()[..len]);

        TestSection {
            name: raw_name,
            virtual_address,
            virtual_size,
            size_of_raw_data,
            pointer_to_raw_data,
            characteristics: 0x6000_0020, // CNT_CODE | MEM_EXECUTE | MEM_READ
            data: Vec::new(),
        }
    }

    /// Raw bytes written at `pointer_to_raw_data`.
    pub fn with_data(mut self, data: Vec<u8>) -> TestSection {
        self.data = data;
        self
    }
}

/// Assembles a synthetic PE32 or PE32+ image.
pub struct PeBuilder {
    pe32_plus: bool,
    machine: u16,
    characteristics: u16,
    directories: Vec<(u32, u32)>,
    optional_header_padding: u16,
    sections: Vec<TestSection>,
}

impl PeBuilder {
    /// 32-bit i386 executable.
    pub fn pe32() -> PeBuilder {
        PeBuilder {
            pe32_plus: false,
            machine: 0x014C,
            characteristics: 0x0102, // EXECUTABLE_IMAGE | MACHINE_32BIT
            directories: vec![(0, 0); 16],
            optional_header_padding: 0,
            sections: Vec::new(),
        }
    }

    /// 64-bit AMD64 executable.
    pub fn pe32_plus() -> PeBuilder {
        PeBuilder {
            pe32_plus: true,
            machine: 0x8664,
            characteristics: 0x0022, // EXECUTABLE_IMAGE | LARGE_ADDRESS_AWARE
            directories: vec![(0, 0); 16],
            optional_header_padding: 0,
            sections: Vec::new(),
        }
    }

    pub fn machine(mut self, machine: u16) -> PeBuilder {
        self.machine = machine;
        self
    }

    pub fn characteristics(mut self, characteristics: u16) -> PeBuilder {
        self.characteristics = characteristics;
        self
    }

    /// Declare `count` data directories, keeping the entries already set.
    pub fn directory_count(mut self, count: usize) -> PeBuilder {
        self.directories.resize(count, (0, 0));
        self
    }

    pub fn directory(mut self, index: usize, rva: u32, size: u32) -> PeBuilder {
        if index >= self.directories.len() {
            self.directories.resize(index + 1, (0, 0));
        }
        self.directories[index] = (rva, size);
        self
    }

    /// Grow `SizeOfOptionalHeader` by `padding` zero bytes after the data directories.
    pub fn optional_header_padding(mut self, padding: u16) -> PeBuilder {
        self.optional_header_padding = padding;
        self
    }

    pub fn section(mut self, section: TestSection) -> PeBuilder {
        self.sections.push(section);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut optional = optional_header(self.pe32_plus, &self.directories);
        let padded = optional.len() + usize::from(self.optional_header_padding);
        optional.resize(padded, 0);

        let mut pe = Vec::new();

        // DOS header
        pe.extend_from_slice(b"MZ"); // e_magic
        pe.resize(0x3C, 0);
        pe.extend_from_slice(&(PE_OFFSET as u32).to_le_bytes()); // e_lfanew
        pe.resize(PE_OFFSET, 0);

        pe.extend_from_slice(b"PE\0\0");

        // COFF header
        pe.extend_from_slice(&self.machine.to_le_bytes()); // Machine
        pe.extend_from_slice(&(self.sections.len() as u16).to_le_bytes()); // NumberOfSections
        pe.extend_from_slice(&0x6530_0000u32.to_le_bytes()); // TimeDateStamp
        pe.extend_from_slice(&0u32.to_le_bytes()); // PointerToSymbolTable
        pe.extend_from_slice(&0u32.to_le_bytes()); // NumberOfSymbols
        pe.extend_from_slice(&(optional.len() as u16).to_le_bytes()); // SizeOfOptionalHeader
        pe.extend_from_slice(&self.characteristics.to_le_bytes()); // Characteristics

        pe.extend_from_slice(&optional);

        for section in &self.sections {
            pe.extend_from_slice(&section.name);
            pe.extend_from_slice(&section.virtual_size.to_le_bytes());
            pe.extend_from_slice(&section.virtual_address.to_le_bytes());
            pe.extend_from_slice(&section.size_of_raw_data.to_le_bytes());
            pe.extend_from_slice(&section.pointer_to_raw_data.to_le_bytes());
            pe.extend_from_slice(&0u32.to_le_bytes()); // PointerToRelocations
            pe.extend_from_slice(&0u32.to_le_bytes()); // PointerToLinenumbers
            pe.extend_from_slice(&0u16.to_le_bytes()); // NumberOfRelocations
            pe.extend_from_slice(&0u16.to_le_bytes()); // NumberOfLinenumbers
            pe.extend_from_slice(&section.characteristics.to_le_bytes());
        }

        for section in &self.sections {
            let start = section.pointer_to_raw_data as usize;
            let end = start + (section.size_of_raw_data as usize).max(section.data.len());
            if pe.len() < end {
                pe.resize(end, 0);
            }
            pe[start..start + section.data.len()].copy_from_slice(&section.data);
        }

        pe
    }
}

/// A 72-byte Cor20 header pointing at metadata `(rva, size)`.
pub fn cor20_header(metadata_rva: u32, metadata_size: u32, flags: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(72);
    header.extend_from_slice(&72u32.to_le_bytes()); // cb
    header.extend_from_slice(&2u16.to_le_bytes()); // MajorRuntimeVersion
    header.extend_from_slice(&5u16.to_le_bytes()); // MinorRuntimeVersion
    header.extend_from_slice(&metadata_rva.to_le_bytes()); // MetaData
    header.extend_from_slice(&metadata_size.to_le_bytes());
    header.extend_from_slice(&flags.to_le_bytes()); // Flags
    header.extend_from_slice(&0x0600_0001u32.to_le_bytes()); // EntryPointToken
    header.resize(72, 0); // Resources .. ManagedNativeHeader
    header
}

/// A `BSJB` metadata root with version `v4.0.30319` and the given `(offset, size, name)` streams.
pub fn metadata_root(streams: &[(u32, u32, &str)]) -> Vec<u8> {
    let mut root = Vec::new();
    root.extend_from_slice(&0x424A_5342u32.to_le_bytes()); // Signature
    root.extend_from_slice(&1u16.to_le_bytes()); // MajorVersion
    root.extend_from_slice(&1u16.to_le_bytes()); // MinorVersion
    root.extend_from_slice(&0u32.to_le_bytes()); // Reserved
    root.extend_from_slice(&12u32.to_le_bytes()); // Length
    root.extend_from_slice(b"v4.0.30319\0\0"); // Version
    root.push(0); // Flags
    root.push(0); // Pad
    root.extend_from_slice(&(streams.len() as u16).to_le_bytes()); // Streams

    for (offset, size, name) in streams {
        root.extend_from_slice(&offset.to_le_bytes());
        root.extend_from_slice(&size.to_le_bytes());
        let name_start = root.len();
        root.extend_from_slice(name.as_bytes());
        root.push(0);
        while !(root.len() - name_start).is_multiple_of(4) {
            root.push(0);
        }
    }

    root
}

/// A `#~` stream header with one row count per set bit of `mask_valid`.
pub fn table_stream(
    mask_valid: u64,
    mask_sorted: u64,
    heap_sizes: u8,
    row_counts: &[u32],
) -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend_from_slice(&0u32.to_le_bytes()); // Reserved
    stream.push(2); // MajorVersion
    stream.push(0); // MinorVersion
    stream.push(heap_sizes); // HeapSizes
    stream.push(1); // Reserved
    stream.extend_from_slice(&mask_valid.to_le_bytes()); // Valid
    stream.extend_from_slice(&mask_sorted.to_le_bytes()); // Sorted
    for rows in row_counts {
        stream.extend_from_slice(&rows.to_le_bytes());
    }
    stream
}

/// Tables present in [`managed_image`]: Module, TypeRef, TypeDef, MethodDef, MemberRef,
/// Assembly and AssemblyRef
pub const MANAGED_MASK_VALID: u64 =
    (1 << 0x00) | (1 << 0x01) | (1 << 0x02) | (1 << 0x06) | (1 << 0x0A) | (1 << 0x20) | (1 << 0x23);

/// Row counts of [`managed_image`], in ascending table order
pub const MANAGED_ROW_COUNTS: [u32; 7] = [1, 5, 2, 3, 4, 1, 1];

/// Metadata root followed by its table stream, as placed in [`managed_image`].
pub fn managed_metadata() -> Vec<u8> {
    let streams = [
        (0x6C, 0x40, "#~"),
        (0xAC, 0x40, "#Strings"),
        (0xEC, 0x10, "#US"),
        (0xFC, 0x10, "#GUID"),
        (0x10C, 0x20, "#Blob"),
    ];
    let mut metadata = metadata_root(&streams);
    metadata.extend(table_stream(
        MANAGED_MASK_VALID,
        0x0000_1600_3301_FA00,
        0,
        &MANAGED_ROW_COUNTS,
    ));
    metadata.resize(0x12C, 0);
    metadata
}

/// A PE32 image whose `.text` section holds a Cor20 header at `MANAGED_CLR_RVA` pointing at
/// `metadata_rva`, and `metadata` at `MANAGED_METADATA_RVA`.
pub fn managed_image_from(metadata: &[u8], metadata_rva: u32) -> Vec<u8> {
    let mut text = vec![0u8; 0x400];
    text[0x08..0x08 + 72].copy_from_slice(&cor20_header(
        metadata_rva,
        metadata.len() as u32,
        0x0000_0001,
    ));
    text[0x50..0x50 + metadata.len()].copy_from_slice(metadata);

    PeBuilder::pe32()
        .directory(14, MANAGED_CLR_RVA, 72)
        .section(
            TestSection::new(".text", MANAGED_TEXT_RVA, 0x400, 0x400, MANAGED_TEXT_RAW)
                .with_data(text),
        )
        .build()
}

/// A complete managed image with all five standard streams.
pub fn managed_image() -> Vec<u8> {
    managed_image_from(&managed_metadata(), MANAGED_METADATA_RVA)
}
