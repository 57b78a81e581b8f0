//! USB Test & Measurement Class transport over libusb.
//!
//! Only the bulk message exchange is implemented; that is all SCPI traffic needs. Class
//! control requests (INITIATE_CLEAR, READ_STATUS_BYTE, ...) are never issued.

use std::io;
use std::time::Duration;

use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};

use crate::{Error, Result};
use super::{Bus, ResourceName, Session, SessionOptions};
use super::framing::{BulkPipe, MessageChannel};

const USBTMC_CLASS: u8 = 0xfe;
const USBTMC_SUBCLASS: u8 = 0x03;

fn bus_io(error: rusb::Error) -> Error {
    let kind = match error {
        rusb::Error::Timeout      => io::ErrorKind::TimedOut,
        rusb::Error::NoDevice     => io::ErrorKind::NotConnected,
        rusb::Error::NotFound     => io::ErrorKind::NotFound,
        rusb::Error::Access       => io::ErrorKind::PermissionDenied,
        rusb::Error::Interrupted  => io::ErrorKind::Interrupted,
        rusb::Error::InvalidParam => io::ErrorKind::InvalidInput,
        rusb::Error::NotSupported => io::ErrorKind::Unsupported,
        _ => io::ErrorKind::Other,
    };
    Error::BusIo(io::Error::new(kind, error))
}

#[derive(Debug, Clone, Copy)]
struct Endpoints {
    interface: u8,
    setting: u8,
    bulk_in: u8,
    bulk_out: u8,
}

fn find_endpoints<T: UsbContext>(device: &Device<T>) -> rusb::Result<Option<Endpoints>> {
    let config = device.active_config_descriptor()?;
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            if descriptor.class_code() != USBTMC_CLASS ||
                    descriptor.sub_class_code() != USBTMC_SUBCLASS {
                continue
            }
            let mut bulk_in = None;
            let mut bulk_out = None;
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.transfer_type() != TransferType::Bulk { continue }
                match endpoint.direction() {
                    Direction::In  => bulk_in = bulk_in.or(Some(endpoint.address())),
                    Direction::Out => bulk_out = bulk_out.or(Some(endpoint.address())),
                }
            }
            if let (Some(bulk_in), Some(bulk_out)) = (bulk_in, bulk_out) {
                return Ok(Some(Endpoints {
                    interface: descriptor.interface_number(),
                    setting: descriptor.setting_number(),
                    bulk_in,
                    bulk_out,
                }))
            }
        }
    }
    Ok(None)
}

fn read_serial<T: UsbContext>(device: &Device<T>, descriptor: &DeviceDescriptor) -> Option<String> {
    match device.open().and_then(|handle| handle.read_serial_number_string_ascii(descriptor)) {
        Ok(serial) => Some(serial),
        Err(error) => {
            log::debug!("cannot read serial number of {:04x}:{:04x}: {}",
                        descriptor.vendor_id(), descriptor.product_id(), error);
            None
        }
    }
}

/// Bus access through a libusb context; released when dropped.
pub struct UsbtmcBus {
    context: Context,
}

impl UsbtmcBus {
    pub fn new() -> Result<UsbtmcBus> {
        let context = Context::new().map_err(|error| Error::Initialization(Box::new(error)))?;
        log::debug!("acquired USB bus access");
        Ok(UsbtmcBus { context })
    }

    /// All USBTMC devices on the bus together with their resource names.
    fn instruments(&self) -> Result<Vec<(Device<Context>, Endpoints, ResourceName)>> {
        let mut instruments = Vec::new();
        for device in self.context.devices().map_err(bus_io)?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    log::debug!("skipping device at {}:{}: {}", device.bus_number(), device.address(), error);
                    continue
                }
            };
            let endpoints = match find_endpoints(&device) {
                Ok(Some(endpoints)) => endpoints,
                Ok(None) => continue,
                Err(error) => {
                    log::debug!("skipping device at {}:{}: {}", device.bus_number(), device.address(), error);
                    continue
                }
            };
            let name = ResourceName {
                board: 0,
                vendor_id: descriptor.vendor_id(),
                product_id: descriptor.product_id(),
                serial: read_serial(&device, &descriptor),
                interface: None,
            };
            log::trace!("found USBTMC device {} ({:?})", name, endpoints);
            instruments.push((device, endpoints, name));
        }
        Ok(instruments)
    }
}

impl Bus for UsbtmcBus {
    type Session = UsbtmcSession;

    fn list_resources(&mut self) -> Result<Vec<String>> {
        Ok(self.instruments()?.into_iter().map(|(_, _, name)| name.to_string()).collect())
    }

    fn open(&mut self, resource: &str, options: &SessionOptions) -> Result<UsbtmcSession> {
        let wanted: ResourceName = resource.parse()?;
        let (device, endpoints, _) = self.instruments()?.into_iter()
            .find(|(_, endpoints, name)| {
                name.vendor_id == wanted.vendor_id &&
                    name.product_id == wanted.product_id &&
                    (wanted.serial.is_none() || name.serial == wanted.serial) &&
                    wanted.interface.map_or(true, |interface| interface == endpoints.interface)
            })
            .ok_or_else(|| Error::BusIo(io::Error::new(io::ErrorKind::NotFound,
                format!("instrument {} not connected", resource))))?;

        let mut handle = device.open().map_err(bus_io)?;
        if let Err(error) = handle.set_auto_detach_kernel_driver(true) {
            log::debug!("kernel driver auto-detach unavailable: {}", error);
        }
        handle.claim_interface(endpoints.interface).map_err(bus_io)?;
        if endpoints.setting != 0 {
            handle.set_alternate_setting(endpoints.interface, endpoints.setting).map_err(bus_io)?;
        }
        log::debug!("opened {} on interface {} (bulk in {:#04x}, bulk out {:#04x})",
                    resource, endpoints.interface, endpoints.bulk_in, endpoints.bulk_out);

        let pipe = UsbPipe { handle, endpoints, timeout: options.timeout };
        Ok(UsbtmcSession {
            channel: MessageChannel::new(pipe, options.chunk_size),
            claimed: true,
        })
    }
}

impl Drop for UsbtmcBus {
    fn drop(&mut self) {
        log::debug!("released USB bus access");
    }
}

struct UsbPipe {
    handle: DeviceHandle<Context>,
    endpoints: Endpoints,
    timeout: Duration,
}

impl BulkPipe for UsbPipe {
    fn write_bulk(&mut self, data: &[u8]) -> Result<usize> {
        self.handle.write_bulk(self.endpoints.bulk_out, data, self.timeout).map_err(bus_io)
    }

    fn read_bulk(&mut self, buffer: &mut [u8]) -> Result<usize> {
        self.handle.read_bulk(self.endpoints.bulk_in, buffer, self.timeout).map_err(bus_io)
    }
}

pub struct UsbtmcSession {
    channel: MessageChannel<UsbPipe>,
    claimed: bool,
}

impl Session for UsbtmcSession {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.channel.write_message(data)
    }

    fn read(&mut self) -> Result<Vec<u8>> {
        self.channel.read_message()
    }

    fn close(&mut self) -> Result<()> {
        if self.claimed {
            self.claimed = false;
            let pipe = self.channel.pipe_mut();
            pipe.handle.release_interface(pipe.endpoints.interface).map_err(bus_io)?;
            log::debug!("released USBTMC interface {}", pipe.endpoints.interface);
        }
        Ok(())
    }
}

impl Drop for UsbtmcSession {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            log::warn!("failed to release USBTMC interface: {}", error);
        }
    }
}
