//! Page-table bus dispatcher.
//!
//! The address space is split into fixed-size pages. Each page points at the
//! device that owns it; unmapped pages point at [`NullDevice`]. One device
//! may additionally be the snooper, which sees every access on the bus
//! before the owning device does. Cartridges use this to catch bank-switch
//! hotspots that alias outside their own window.

use crate::{
    AccessContext, Bus, BusError, BusSnapshot, Device, DeviceId, Logger, Mapping, NullDevice,
    Signals, SnapshotError,
};

/// The CPU-visible address space.
pub struct AddressSpace {
    address_bits: u32,
    page_bits: u32,
    address_mask: u16,
    pages: Vec<DeviceId>,
    devices: Vec<Box<dyn Device>>,
    snooper: Option<DeviceId>,
    data_bus_latch: u8,
    ctx: AccessContext,
    logger: Logger,
}

impl AddressSpace {
    /// Create an address space of `1 << address_bits` bytes split into
    /// pages of `1 << page_bits` bytes, all pointing at the null device.
    pub fn new(address_bits: u32, page_bits: u32) -> Result<Self, BusError> {
        if address_bits == 0 || address_bits > 16 || page_bits > address_bits {
            return Err(BusError::InvalidGeometry {
                address_bits,
                page_bits,
            });
        }

        let size = 1usize << address_bits;
        Ok(Self {
            address_bits,
            page_bits,
            address_mask: (size - 1) as u16,
            pages: vec![DeviceId::NULL; size >> page_bits],
            devices: vec![Box::new(NullDevice)],
            snooper: None,
            data_bus_latch: 0,
            ctx: AccessContext::default(),
            logger: Logger::silent(),
        })
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub const fn address_bits(&self) -> u32 {
        self.address_bits
    }

    #[must_use]
    pub const fn page_bits(&self) -> u32 {
        self.page_bits
    }

    /// Total bytes addressable.
    #[must_use]
    pub const fn size(&self) -> u32 {
        1 << self.address_bits
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        1 << self.page_bits
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Mask applied to every CPU address before dispatch.
    #[must_use]
    pub const fn address_mask(&self) -> u16 {
        self.address_mask
    }

    /// Hand a device to the address space without mapping it yet.
    pub fn add_device(&mut self, device: Box<dyn Device>) -> DeviceId {
        self.devices.push(device);
        DeviceId(self.devices.len() - 1)
    }

    /// Add a device and map it in one go.
    ///
    /// Nothing is added if the mapping would be rejected.
    pub fn attach(
        &mut self,
        base: u16,
        size: u32,
        device: Box<dyn Device>,
    ) -> Result<DeviceId, BusError> {
        self.check_range(base, size)?;
        self.check_snooper(None, device.as_ref())?;
        let id = self.add_device(device);
        self.map(base, size, id)?;
        Ok(id)
    }

    /// Point every page in `base..base + size` at `id`, then notify the
    /// device. The same device may be mapped at several ranges (mirrors).
    pub fn map(&mut self, base: u16, size: u32, id: DeviceId) -> Result<(), BusError> {
        self.check_range(base, size)?;
        let device = self
            .devices
            .get(id.0)
            .ok_or(BusError::UnknownDevice(id))?;
        self.check_snooper(Some(id), device.as_ref())?;
        let snoops = device.wants_bus_snooping();

        let first = (base as usize) >> self.page_bits;
        let count = (size as usize) >> self.page_bits;
        for page in &mut self.pages[first..first + count] {
            *page = id;
        }

        if snoops && self.snooper != Some(id) {
            self.snooper = Some(id);
            self.logger.debug(
                "bus",
                format_args!("{} installed as bus snooper", self.devices[id.0].name()),
            );
        }
        if let Some(snooper) = self.snooper
            && !self.pages.contains(&snooper)
        {
            self.logger.debug(
                "bus",
                format_args!("{} no longer mapped, snooping stops", self.devices[snooper.0].name()),
            );
            self.snooper = None;
        }

        let mapping = Mapping {
            base,
            size,
            page_size: self.page_size(),
            address_mask: self.address_mask,
        };
        let device = &mut self.devices[id.0];
        self.logger.debug(
            "bus",
            format_args!(
                "mapped {} at ${:04X}-${:04X}",
                device.name(),
                base,
                u32::from(base) + size - 1
            ),
        );
        device.on_mapped(mapping);
        Ok(())
    }

    /// Point a range back at the null device.
    pub fn unmap(&mut self, base: u16, size: u32) -> Result<(), BusError> {
        self.map(base, size, DeviceId::NULL)
    }

    /// Device owning `address`.
    #[must_use]
    pub fn owner(&self, address: u16) -> DeviceId {
        let address = address & self.address_mask;
        self.pages[(address as usize) >> self.page_bits]
    }

    /// Current snooper, if any.
    #[must_use]
    pub const fn snooper(&self) -> Option<DeviceId> {
        self.snooper
    }

    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&dyn Device> {
        self.devices.get(id.0).map(AsRef::as_ref)
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn Device> {
        match self.devices.get_mut(id.0) {
            Some(device) => Some(device.as_mut()),
            None => None,
        }
    }

    /// Number of attached devices, not counting the null device.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len() - 1
    }

    /// Last byte that crossed the bus.
    #[must_use]
    pub const fn data_bus_latch(&self) -> u8 {
        self.data_bus_latch
    }

    /// Reset every attached device.
    pub fn reset_devices(&mut self) {
        for device in &mut self.devices {
            device.reset();
        }
        self.data_bus_latch = 0;
        self.ctx.set_data_bus(0);
        let _ = self.ctx.take_signals();
    }

    #[must_use]
    pub fn snapshot(&self) -> BusSnapshot {
        BusSnapshot {
            data_bus_latch: self.data_bus_latch,
            devices: self.devices[1..].iter().map(|d| d.snapshot()).collect(),
        }
    }

    /// Check that `snapshot` was taken from this device layout without
    /// changing anything.
    pub fn check_snapshot(&self, snapshot: &BusSnapshot) -> Result<(), SnapshotError> {
        if snapshot.devices.len() != self.device_count() {
            return Err(SnapshotError::DeviceCountMismatch {
                found: snapshot.devices.len(),
                expected: self.device_count(),
            });
        }
        for (index, (device, saved)) in self.devices[1..].iter().zip(&snapshot.devices).enumerate() {
            if device.name() != saved.name {
                return Err(SnapshotError::DeviceMismatch {
                    index,
                    expected: device.name().to_string(),
                    found: saved.name.clone(),
                });
            }
            device.check_snapshot(saved)?;
        }
        Ok(())
    }

    /// Restore every device. A snapshot that fails [`Self::check_snapshot`]
    /// is rejected before any device is touched.
    pub fn restore(&mut self, snapshot: &BusSnapshot) -> Result<(), SnapshotError> {
        self.check_snapshot(snapshot)?;
        for (device, saved) in self.devices[1..].iter_mut().zip(&snapshot.devices) {
            device.restore(saved)?;
        }

        self.data_bus_latch = snapshot.data_bus_latch;
        self.ctx.set_data_bus(snapshot.data_bus_latch);
        Ok(())
    }

    fn check_range(&self, base: u16, size: u32) -> Result<(), BusError> {
        let page_size = self.page_size();
        if size == 0 || size % page_size != 0 || u32::from(base) % page_size != 0 {
            return Err(BusError::UnalignedMapping {
                base,
                size,
                page_size,
            });
        }
        if u32::from(base) + size > self.size() {
            return Err(BusError::OutOfRange {
                base,
                size,
                limit: self.size(),
            });
        }
        Ok(())
    }

    fn check_snooper(&self, id: Option<DeviceId>, device: &dyn Device) -> Result<(), BusError> {
        match self.snooper {
            Some(existing) if device.wants_bus_snooping() && Some(existing) != id => {
                Err(BusError::SecondSnooper {
                    existing: self.devices[existing.0].name().to_string(),
                    rejected: device.name().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn latch(&mut self, value: u8) {
        self.data_bus_latch = value;
        self.ctx.set_data_bus(value);
    }
}

impl Bus for AddressSpace {
    fn read(&mut self, address: u16) -> u8 {
        let address = address & self.address_mask;
        let owner = self.owner(address);
        if let Some(snooper) = self.snooper.filter(|&s| s != owner) {
            let _ = self.devices[snooper.0].read(address, &mut self.ctx);
        }
        let value = self.devices[owner.0].read(address, &mut self.ctx);
        self.latch(value);
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        let address = address & self.address_mask;
        self.latch(value);
        let owner = self.owner(address);
        if let Some(snooper) = self.snooper.filter(|&s| s != owner) {
            self.devices[snooper.0].write(address, value, &mut self.ctx);
        }
        self.devices[owner.0].write(address, value, &mut self.ctx);
    }

    fn sync_clock(&mut self, clock: u64) {
        self.ctx.set_clock(clock);
    }

    fn take_signals(&mut self) -> Signals {
        self.ctx.take_signals()
    }
}

impl std::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("address_bits", &self.address_bits)
            .field("page_bits", &self.page_bits)
            .field("devices", &self.devices.iter().map(|d| d.name()).collect::<Vec<_>>())
            .field("snooper", &self.snooper)
            .field("data_bus_latch", &self.data_bus_latch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceSnapshot;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<String>>>;

    /// Records every access; reads return a fixed tag byte.
    struct Tagged {
        name: &'static str,
        tag: u8,
        snoops: bool,
        trace: Trace,
    }

    impl Tagged {
        fn boxed(name: &'static str, tag: u8, snoops: bool, trace: &Trace) -> Box<Self> {
            Box::new(Self {
                name,
                tag,
                snoops,
                trace: Rc::clone(trace),
            })
        }
    }

    impl Device for Tagged {
        fn name(&self) -> &str {
            self.name
        }

        fn read(&mut self, address: u16, _ctx: &mut AccessContext) -> u8 {
            self.trace
                .borrow_mut()
                .push(format!("{} read ${address:04X}", self.name));
            self.tag
        }

        fn write(&mut self, address: u16, value: u8, _ctx: &mut AccessContext) {
            self.trace
                .borrow_mut()
                .push(format!("{} write ${address:04X}={value:02X}", self.name));
        }

        fn wants_bus_snooping(&self) -> bool {
            self.snoops
        }
    }

    /// 64 bytes of storage that steals a cycle and requests preemption on
    /// writes to its last byte.
    struct Scratch {
        name: &'static str,
        bytes: [u8; 64],
        seen_clock: Rc<Cell<u64>>,
    }

    impl Device for Scratch {
        fn name(&self) -> &str {
            self.name
        }

        fn read(&mut self, address: u16, ctx: &mut AccessContext) -> u8 {
            self.seen_clock.set(ctx.clock());
            self.bytes[usize::from(address & 0x3F)]
        }

        fn write(&mut self, address: u16, value: u8, ctx: &mut AccessContext) {
            let offset = usize::from(address & 0x3F);
            self.bytes[offset] = value;
            if offset == 0x3F {
                ctx.steal_cycles(3);
                ctx.request_preempt();
            }
        }

        fn snapshot(&self) -> DeviceSnapshot {
            DeviceSnapshot {
                name: self.name().to_string(),
                registers: Vec::new(),
                ram: self.bytes.to_vec(),
            }
        }

        fn check_snapshot(&self, snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
            if snapshot.ram.len() != self.bytes.len() {
                return Err(SnapshotError::RamSizeMismatch {
                    device: self.name.to_string(),
                    found: snapshot.ram.len(),
                    expected: self.bytes.len(),
                });
            }
            Ok(())
        }

        fn restore(&mut self, snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
            self.check_snapshot(snapshot)?;
            self.bytes.copy_from_slice(&snapshot.ram);
            Ok(())
        }
    }

    fn scratch() -> Box<Scratch> {
        named_scratch("scratch", &Rc::default())
    }

    fn named_scratch(name: &'static str, clock: &Rc<Cell<u64>>) -> Box<Scratch> {
        Box::new(Scratch {
            name,
            bytes: [0; 64],
            seen_clock: Rc::clone(clock),
        })
    }

    fn trace() -> Trace {
        Rc::new(RefCell::new(Vec::new()))
    }

    /// Keeps every mapping it is told about.
    struct MapRecorder(Rc<RefCell<Vec<Mapping>>>);

    impl Device for MapRecorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_mapped(&mut self, mapping: Mapping) {
            self.0.borrow_mut().push(mapping);
        }

        fn read(&mut self, _address: u16, _ctx: &mut AccessContext) -> u8 {
            0
        }

        fn write(&mut self, _address: u16, _value: u8, _ctx: &mut AccessContext) {}
    }

    #[test]
    fn map_notifies_the_device() {
        let mappings = Rc::new(RefCell::new(Vec::new()));
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let id = bus
            .attach(0x1000, 0x1000, Box::new(MapRecorder(Rc::clone(&mappings))))
            .expect("recorder");
        bus.map(0x0800, 0x40, id).expect("mirror");

        let mappings = mappings.borrow();
        assert_eq!(mappings.len(), 2);
        assert_eq!(
            mappings[0],
            Mapping {
                base: 0x1000,
                size: 0x1000,
                page_size: 64,
                address_mask: 0x1FFF,
            }
        );
        assert!(mappings[1].contains(0x083F));
        assert!(!mappings[1].contains(0x0840));
    }

    #[test]
    fn geometry() {
        let bus = AddressSpace::new(13, 6).expect("valid geometry");
        assert_eq!(bus.size(), 0x2000);
        assert_eq!(bus.page_size(), 64);
        assert_eq!(bus.page_count(), 128);
        assert_eq!(bus.address_mask(), 0x1FFF);
        assert!(AddressSpace::new(17, 6).is_err());
        assert!(AddressSpace::new(8, 9).is_err());
    }

    #[test]
    fn unmapped_pages_resolve_to_null_device() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        for address in (0..0x2000u16).step_by(0x40) {
            assert_eq!(bus.owner(address), DeviceId::NULL);
        }
        bus.write(0x0100, 0x5A);
        // Null device floats the data bus.
        assert_eq!(bus.read(0x1234), 0x5A);
    }

    #[test]
    fn map_rejects_sizes_off_the_page_grid() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let trace = trace();
        let err = bus
            .attach(0x1000, 100, Tagged::boxed("cart", 0, false, &trace))
            .unwrap_err();
        assert!(matches!(err, BusError::UnalignedMapping { size: 100, .. }));
        assert_eq!(bus.device_count(), 0, "rejected attach leaves nothing behind");

        let err = bus
            .attach(0x1010, 0x40, Tagged::boxed("cart", 0, false, &trace))
            .unwrap_err();
        assert!(matches!(err, BusError::UnalignedMapping { base: 0x1010, .. }));

        let err = bus
            .attach(0x1000, 0x2000, Tagged::boxed("cart", 0, false, &trace))
            .unwrap_err();
        assert!(matches!(err, BusError::OutOfRange { .. }));
    }

    #[test]
    fn second_snooper_is_rejected() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let trace = trace();
        let first = bus
            .attach(0x1000, 0x1000, Tagged::boxed("cart", 0, true, &trace))
            .expect("first snooper");
        assert_eq!(bus.snooper(), Some(first));

        let err = bus
            .attach(0x0800, 0x40, Tagged::boxed("other", 0, true, &trace))
            .unwrap_err();
        assert_eq!(
            err,
            BusError::SecondSnooper {
                existing: "cart".to_string(),
                rejected: "other".to_string(),
            }
        );

        // Mirroring the same snooper elsewhere is fine.
        bus.map(0x0800, 0x40, first).expect("mirror of the snooper");
        assert_eq!(bus.snooper(), Some(first));
    }

    #[test]
    fn remap_replaces_ownership() {
        let mut bus = AddressSpace::new(16, 6).expect("valid geometry");
        let trace = trace();
        let old = bus
            .attach(0xF000, 0x1000, Tagged::boxed("bios", 0xB1, false, &trace))
            .expect("bios");
        let new = bus
            .attach(0xF000, 0x1000, Tagged::boxed("cart", 0xCA, false, &trace))
            .expect("cart");

        assert_eq!(bus.owner(0xF000), new);
        assert_eq!(bus.owner(0xFFFF), new);
        assert_eq!(bus.read(0xFFFC), 0xCA);
        assert!(
            trace.borrow().iter().all(|line| !line.starts_with("bios")),
            "no stale dispatch to {old:?}"
        );
    }

    #[test]
    fn snooper_sees_write_before_owner() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let trace = trace();
        bus.attach(0x1000, 0x1000, Tagged::boxed("cart", 0, true, &trace))
            .expect("cart");
        bus.attach(0x0000, 0x80, Tagged::boxed("tia", 0, false, &trace))
            .expect("tia");

        bus.write(0x003F, 0x02);

        assert_eq!(
            *trace.borrow(),
            vec!["cart write $003F=02".to_string(), "tia write $003F=02".to_string()]
        );
        assert_eq!(bus.data_bus_latch(), 0x02);
    }

    #[test]
    fn snooper_result_is_discarded_on_reads() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let trace = trace();
        bus.attach(0x1000, 0x1000, Tagged::boxed("cart", 0xEE, true, &trace))
            .expect("cart");
        bus.attach(0x0000, 0x80, Tagged::boxed("tia", 0x11, false, &trace))
            .expect("tia");

        assert_eq!(bus.read(0x0002), 0x11);
        assert_eq!(bus.data_bus_latch(), 0x11);
        assert_eq!(trace.borrow().len(), 2);

        // An access inside the snooper's own pages reaches it once.
        trace.borrow_mut().clear();
        assert_eq!(bus.read(0x1FF8), 0xEE);
        assert_eq!(*trace.borrow(), vec!["cart read $1FF8".to_string()]);
    }

    #[test]
    fn snooper_cleared_when_fully_remapped() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let trace = trace();
        bus.attach(0x1000, 0x1000, Tagged::boxed("cart", 0, true, &trace))
            .expect("cart");
        bus.unmap(0x1000, 0x1000).expect("unmap");
        assert_eq!(bus.snooper(), None);
    }

    #[test]
    fn addresses_are_masked_to_the_bus_width() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let id = bus.attach(0x1FC0, 0x40, scratch()).expect("scratch");
        assert_eq!(bus.owner(0xFFFC), id);
        bus.write(0xFFFC, 0x42);
        assert_eq!(bus.read(0x1FFC), 0x42);
    }

    #[test]
    fn devices_raise_signals_and_see_the_clock() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let clock = Rc::new(Cell::new(0));
        bus.attach(0x0080, 0x40, named_scratch("scratch", &clock))
            .expect("scratch");

        bus.sync_clock(1234);
        bus.read(0x0080);
        assert_eq!(clock.get(), 1234);

        bus.write(0x00BF, 1);
        let signals = bus.take_signals();
        assert_eq!(signals.stolen_cycles, 3);
        assert!(signals.preempt);
        assert!(bus.take_signals().is_idle(), "signals drain once");
        assert!(bus.ctx.signals().is_idle());

        bus.sync_clock(5000);
        bus.read(0x0081);
        assert_eq!(clock.get(), 5000);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        bus.attach(0x0080, 0x40, scratch()).expect("scratch");
        bus.write(0x0081, 0x99);
        let saved = bus.snapshot();

        bus.write(0x0081, 0x00);
        bus.restore(&saved).expect("restore");
        assert_eq!(bus.read(0x0081), 0x99);

        let json = serde_json::to_string(&saved).expect("serialize");
        let parsed: BusSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, saved);
    }

    #[test]
    fn restore_rejects_other_device_layouts() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        bus.attach(0x0080, 0x40, scratch()).expect("scratch");
        let err = bus.restore(&BusSnapshot::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::DeviceCountMismatch { .. }));
    }

    #[test]
    fn rejected_restore_leaves_every_device_untouched() {
        let mut bus = AddressSpace::new(13, 6).expect("valid geometry");
        let clock = Rc::default();
        bus.attach(0x0080, 0x40, named_scratch("a", &clock)).expect("a");
        bus.attach(0x00C0, 0x40, named_scratch("b", &clock)).expect("b");
        bus.write(0x0085, 0x11);

        let mut renamed = bus.snapshot();
        renamed.devices[0].ram[5] = 0x77;
        renamed.data_bus_latch = 0xEE;
        renamed.devices[1].name = "wrong".to_string();
        assert_eq!(
            bus.restore(&renamed),
            Err(SnapshotError::DeviceMismatch {
                index: 1,
                expected: "b".to_string(),
                found: "wrong".to_string(),
            })
        );
        assert_eq!(bus.data_bus_latch(), 0x11);
        assert_eq!(bus.read(0x0085), 0x11, "device a unchanged");

        let mut short = bus.snapshot();
        short.devices[0].ram[5] = 0x77;
        short.devices[1].ram.truncate(10);
        assert!(matches!(
            bus.restore(&short),
            Err(SnapshotError::RamSizeMismatch { found: 10, expected: 64, .. })
        ));
        assert_eq!(bus.read(0x0085), 0x11, "device a unchanged");
    }
}
