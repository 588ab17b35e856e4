//! SSD1306 OLED display wrapper.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use multisynth::{Error, OptionList};

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Display<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let _ = display.init();
    display.clear_buffer();
    let _ = display.flush();
    display
}

fn text_style() -> embedded_graphics::mono_font::MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn draw_two_lines<I2C>(display: &mut Display<I2C>, first: &str, second: &str)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::new(first, Point::new(0, 10), text_style()).draw(display);
    let _ = Text::new(second, Point::new(0, 24), text_style()).draw(display);

    if display.flush().is_err() {
        defmt::warn!("Display: flush failed");
    }
}

/// Start-up screen, shown while settings load.
pub fn draw_loading<I2C>(display: &mut Display<I2C>)
where
    I2C: embedded_hal::i2c::I2c,
{
    draw_two_lines(display, "Multisynth", "Loading...");
}

/// Selection screen with `<` / `>` markers for the available directions.
pub fn draw_selection<I2C>(display: &mut Display<I2C>, options: OptionList<'_>, index: usize)
where
    I2C: embedded_hal::i2c::I2c,
{
    let label = options.label(index);
    draw_two_lines(display, "Select Synth", label.as_str());
}

/// Launch screen, shown during teardown.
pub fn draw_launching<I2C>(display: &mut Display<I2C>, name: &str)
where
    I2C: embedded_hal::i2c::I2c,
{
    draw_two_lines(display, "Starting", name);
}

/// Blank the panel and switch it off before hand-off.
pub fn power_off<I2C>(display: &mut Display<I2C>) -> Result<(), Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();
    display.flush().map_err(|_| Error::Display)?;
    display.set_display_on(false).map_err(|_| Error::Display)
}
