//! USB HID keyboard + consumer control for ATmega32U4.
//!
//! One HID interface with two reports on a single interrupt IN endpoint:
//! report 1 is a 6KRO keyboard report, report 2 carries four consumer
//! control usages (media keys). Uses direct register access via avr-device.

use avr_device::atmega32u4::{PLL, USB_DEVICE};

use mediapad_core::report::SendFilter;
use mediapad_core::{KeyReport, ReportSink};

const KEYBOARD_REPORT_ID: u8 = 1;
const MEDIA_REPORT_ID: u8 = 2;

// USB endpoint configuration
const EP0_SIZE: u8 = 64; // Control endpoint size
const EP1_SIZE: u8 = 16; // Interrupt IN endpoint size (report ID + 8 bytes)

static HID_REPORT_DESCRIPTOR: [u8; 91] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, KEYBOARD_REPORT_ID, // Report ID
    // Modifier keys (8 bits)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - LCtrl
    0x29, 0xE7, //   Usage Maximum (231) - RGui
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    // LEDs (5 bits)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    // LED padding (3 bits)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    // Keycodes (6 bytes)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, MEDIA_REPORT_ID, // Report ID
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x03, // Logical Maximum (1023)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x03, // Usage Maximum (1023)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

// USB descriptors
static DEVICE_DESCRIPTOR: [u8; 18] = [
    18,   // bLength
    1,    // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.0)
    0,    // bDeviceClass (defined at interface level)
    0,    // bDeviceSubClass
    0,    // bDeviceProtocol
    EP0_SIZE, // bMaxPacketSize0
    0xC0, 0x16, // idVendor (0x16C0: Van Ooijen Technische Informatica)
    0xDB, 0x27, // idProduct (0x27DB: shared keyboard PID)
    0x01, 0x00, // bcdDevice (1.0)
    1,    // iManufacturer
    2,    // iProduct
    0,    // iSerialNumber
    1,    // bNumConfigurations
];

static CONFIG_DESCRIPTOR: [u8; 34] = [
    // Configuration descriptor
    9,    // bLength
    2,    // bDescriptorType (Configuration)
    34, 0, // wTotalLength
    1,    // bNumInterfaces
    1,    // bConfigurationValue
    0,    // iConfiguration
    0x80, // bmAttributes (bus powered)
    50,   // bMaxPower (100mA)
    // Interface descriptor
    9,    // bLength
    4,    // bDescriptorType (Interface)
    0,    // bInterfaceNumber
    0,    // bAlternateSetting
    1,    // bNumEndpoints
    3,    // bInterfaceClass (HID)
    0,    // bInterfaceSubClass (none: report IDs rule out the boot protocol)
    0,    // bInterfaceProtocol
    0,    // iInterface
    // HID descriptor
    9,    // bLength
    0x21, // bDescriptorType (HID)
    0x11, 0x01, // bcdHID (1.11)
    0,    // bCountryCode
    1,    // bNumDescriptors
    0x22, // bDescriptorType (Report)
    HID_REPORT_DESCRIPTOR.len() as u8, 0, // wDescriptorLength
    // Endpoint descriptor (EP1 IN: interrupt)
    7,    // bLength
    5,    // bDescriptorType (Endpoint)
    0x81, // bEndpointAddress (EP1 IN)
    0x03, // bmAttributes (Interrupt)
    EP1_SIZE, 0, // wMaxPacketSize
    10,   // bInterval (10ms polling)
];

/// String descriptor 0 (language ID)
static STRING_DESC_0: [u8; 4] = [4, 3, 0x09, 0x04]; // English (US)

/// String descriptor 1 (manufacturer): "Mediapad"
static STRING_DESC_1: [u8; 18] = [
    18, 3, // bLength, bDescriptorType
    b'M', 0, b'e', 0, b'd', 0, b'i', 0, b'a', 0, b'p', 0, b'a', 0, b'd', 0,
];

/// String descriptor 2 (product): "Media Dial"
static STRING_DESC_2: [u8; 22] = [
    22, 3, // bLength, bDescriptorType
    b'M', 0, b'e', 0, b'd', 0, b'i', 0, b'a', 0, b' ', 0, b'D', 0, b'i', 0, b'a', 0, b'l', 0,
];

/// USB device state. Doubles as the keypad's report sink.
pub struct UsbKeyboard {
    usb: USB_DEVICE,
    pll: PLL,
    configured: bool,
    keyboard: SendFilter<8>,
    media: SendFilter<8>,
}

impl UsbKeyboard {
    pub const fn new(usb: USB_DEVICE, pll: PLL) -> Self {
        Self {
            usb,
            pll,
            configured: false,
            keyboard: SendFilter::new(),
            media: SendFilter::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Initialize the ATmega32U4 USB controller.
    pub fn init(&mut self) {
        let usb = &self.usb;

        // Enable USB pad regulator
        usb.uhwcon.write(|w| w.uvrege().set_bit());

        // Enable USB controller and VBUS pad
        usb.usbcon
            .write(|w| w.usbe().set_bit().otgpade().set_bit());

        // PLL: 16MHz crystal -> 48MHz USB clock
        self.pll.pllcsr.write(|w| w.pindiv().set_bit().plle().set_bit());
        while self.pll.pllcsr.read().plock().bit_is_clear() {}

        // Enable USB clock
        usb.usbcon.modify(|_, w| w.frzclk().clear_bit());

        // Attach to bus (clear DETACH). Bus events are polled, so no USB
        // interrupts are enabled.
        usb.udcon.modify(|_, w| w.detach().clear_bit());

        self.configured = false;
    }

    /// Handle bus resets and control requests. Call this from the main loop.
    pub fn poll(&mut self) {
        let udint = self.usb.udint.read();

        if udint.eorsti().bit_is_set() {
            self.usb.udint.modify(|_, w| w.eorsti().clear_bit());
            self.configure_ep0();
            self.configured = false;
        }

        self.select_endpoint(0);
        if self.usb.ueintx.read().rxstpi().bit_is_set() {
            self.handle_setup();
        }

        if self.configured {
            let usb = &self.usb;
            self.keyboard
                .flush(&mut |data| write_report(usb, KEYBOARD_REPORT_ID, data));
            self.media
                .flush(&mut |data| write_report(usb, MEDIA_REPORT_ID, data));
        }
    }

    fn configure_ep0(&self) {
        let usb = &self.usb;

        self.select_endpoint(0);
        // Enable EP0 as control endpoint, 64 bytes
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x.write(|w| w.eptype().bits(0b00));
        usb.uecfg1x.write(|w| w.epsize().bits(0b011).alloc().set_bit());
    }

    fn configure_ep1(&self) {
        let usb = &self.usb;

        self.select_endpoint(1);
        usb.ueconx.write(|w| w.epen().set_bit());
        // Interrupt IN endpoint, 16 bytes
        usb.uecfg0x
            .write(|w| w.eptype().bits(0b11).epdir().set_bit());
        usb.uecfg1x.write(|w| w.epsize().bits(0b001).alloc().set_bit());
    }

    fn select_endpoint(&self, ep: u8) {
        self.usb.uenum.write(|w| w.bits(ep & 0x07));
    }

    fn handle_setup(&mut self) {
        let usb = &self.usb;

        // Read 8-byte SETUP packet
        let bm_request_type = usb.uedatx.read().bits();
        let b_request = usb.uedatx.read().bits();
        let w_value_l = usb.uedatx.read().bits();
        let w_value_h = usb.uedatx.read().bits();
        let _w_index_l = usb.uedatx.read().bits();
        let _w_index_h = usb.uedatx.read().bits();
        let w_length_l = usb.uedatx.read().bits();
        let w_length_h = usb.uedatx.read().bits();

        // Acknowledge SETUP
        usb.ueintx.modify(|_, w| w.rxstpi().clear_bit());

        let w_length = (w_length_h as u16) << 8 | w_length_l as u16;

        match (bm_request_type, b_request) {
            // GET_DESCRIPTOR
            (0x80, 0x06) => match (w_value_h, w_value_l) {
                (1, _) => self.send_descriptor(&DEVICE_DESCRIPTOR, w_length),
                (2, _) => self.send_descriptor(&CONFIG_DESCRIPTOR, w_length),
                (3, 0) => self.send_descriptor(&STRING_DESC_0, w_length),
                (3, 1) => self.send_descriptor(&STRING_DESC_1, w_length),
                (3, 2) => self.send_descriptor(&STRING_DESC_2, w_length),
                _ => self.stall(),
            },

            // SET_ADDRESS
            (0x00, 0x05) => {
                // Send ZLP first, then set address
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.udaddr
                    .write(|w| w.uadd().bits(w_value_l & 0x7F).adden().set_bit());
            }

            // SET_CONFIGURATION
            (0x00, 0x09) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                self.configure_ep1();
                self.keyboard.reset();
                self.media.reset();
                self.configured = true;
            }

            // GET_CONFIGURATION
            (0x80, 0x08) => {
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.uedatx
                    .write(|w| w.bits(if self.configured { 1 } else { 0 }));
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // HID GET_DESCRIPTOR (interface-level)
            (0x81, 0x06) => match w_value_h {
                0x22 => self.send_descriptor(&HID_REPORT_DESCRIPTOR, w_length),
                _ => self.stall(),
            },

            // HID SET_REPORT (keyboard LEDs): nothing to light, just accept it
            (0x21, 0x09) => {
                while usb.ueintx.read().rxouti().bit_is_clear() {}
                usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // HID SET_IDLE, SET_PROTOCOL
            (0x21, 0x0A) | (0x21, 0x0B) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            _ => self.stall(),
        }
    }

    fn send_descriptor(&self, desc: &[u8], max_length: u16) {
        let usb = &self.usb;
        let len = core::cmp::min(desc.len(), max_length as usize);
        let mut sent = 0;

        while sent < len {
            while usb.ueintx.read().txini().bit_is_clear() {}

            let chunk_end = core::cmp::min(sent + EP0_SIZE as usize, len);
            for &byte in &desc[sent..chunk_end] {
                usb.uedatx.write(|w| w.bits(byte));
            }

            usb.ueintx.modify(|_, w| w.txini().clear_bit());
            sent = chunk_end;
        }

        // Wait for status stage (host sends ZLP)
        while usb.ueintx.read().rxouti().bit_is_clear() {}
        usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
    }

    fn stall(&self) {
        self.usb.ueconx.modify(|_, w| w.stallrq().set_bit());
    }
}

/// Write one report to EP1. Returns false if the endpoint stayed busy.
fn write_report(usb: &USB_DEVICE, id: u8, data: &[u8; 8]) -> bool {
    usb.uenum.write(|w| w.bits(1));

    // Wait for endpoint ready (RWAL set means we can write)
    let mut timeout: u16 = 0xFFFF;
    while usb.ueintx.read().rwal().bit_is_clear() {
        timeout = timeout.wrapping_sub(1);
        if timeout == 0 {
            return false;
        }
    }

    usb.uedatx.write(|w| w.bits(id));
    for &byte in data {
        usb.uedatx.write(|w| w.bits(byte));
    }

    // Clear FIFOCON and TXINI to send
    usb.ueintx
        .modify(|_, w| w.fifocon().clear_bit().txini().clear_bit());
    true
}

/// Only changed reports go out. A report that times out is retried before
/// the next one, so both halves of a tap reach the host.
impl ReportSink for UsbKeyboard {
    fn commit(&mut self, report: &KeyReport) {
        if !self.configured {
            return;
        }
        let usb = &self.usb;
        self.keyboard.offer(&report.keyboard_bytes(), |data| {
            write_report(usb, KEYBOARD_REPORT_ID, data)
        });
        self.media
            .offer(&report.media_bytes(), |data| write_report(usb, MEDIA_REPORT_ID, data));
    }
}
