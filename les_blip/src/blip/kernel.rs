use bit_field::BitField;

const PHASE_BITS: usize = 5;
const PHASE_COUNT: usize = 1 << PHASE_BITS;
pub(crate) const DELTA_BITS: u32 = 15;
const DELTA_UNIT: i32 = 1 << DELTA_BITS;

const HALF_WIDTH: usize = 8;
/// Cells touched by one delta.
pub const WIDTH: usize = HALF_WIDTH * 2;

/// Kernel used to spread a delta over the output samples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// 16-tap band-limited step, interpolated between 32 phases.
    #[default]
    Standard,
    /// Linear interpolation between two cells. Cheaper, aliases more.
    Fast,
}

impl Quality {
    /// Adds `delta` into `out`, which starts at the first cell of the
    /// kernel span. `frac` is the position between output samples, with
    /// `FRAC_BITS` fraction bits.
    pub(crate) fn spread(self, out: &mut [i32; WIDTH], frac: u32, delta: i32) {
        match self {
            Quality::Standard => {
                let interp_bits = DELTA_BITS as usize;
                let phase = frac.get_bits(interp_bits..interp_bits + PHASE_BITS);
                let interp = frac.get_bits(0..interp_bits);

                let delta2 = ((delta as i64 * interp as i64) >> DELTA_BITS) as i32;
                let delta = delta.wrapping_sub(delta2);

                let in0 = &STEP[phase as usize];
                let in1 = &STEP[phase as usize + 1];
                for ((o, &k0), &k1) in out.iter_mut().zip(in0).zip(in1) {
                    let weighted = k0.wrapping_mul(delta).wrapping_add(k1.wrapping_mul(delta2));
                    *o = o.wrapping_add(weighted);
                }
            }
            Quality::Fast => {
                let interp = frac.get_bits(PHASE_BITS..PHASE_BITS + DELTA_BITS as usize) as i32;
                let delta2 = delta.wrapping_mul(interp);

                out[HALF_WIDTH - 1] = out[HALF_WIDTH - 1]
                    .wrapping_add(delta.wrapping_mul(DELTA_UNIT).wrapping_sub(delta2));
                out[HALF_WIDTH] = out[HALF_WIDTH].wrapping_add(delta2);
            }
        }
    }
}

lazy_static::lazy_static! {
    /// Full step kernel per phase: the half step for the phase, followed by
    /// the mirrored half step of the opposite phase.
    static ref STEP: [[i32; WIDTH]; PHASE_COUNT + 1] = {
        let mut table = [[0i32; WIDTH]; PHASE_COUNT + 1];
        table.iter_mut().enumerate().for_each(|(phase, row)| {
            let (head, tail) = row.split_at_mut(HALF_WIDTH);
            head.copy_from_slice(&BL_STEP[phase]);
            tail.iter_mut()
                .zip(BL_STEP[PHASE_COUNT - phase].iter().rev())
                .for_each(|(t, &k)| *t = k);
        });
        table
    };
}

const BL_STEP: [[i32; HALF_WIDTH]; PHASE_COUNT + 1] = [
    [43, -115, 350, -488, 1136, -914, 5861, 21022],
    [44, -118, 348, -473, 1076, -799, 5274, 21001],
    [45, -121, 344, -454, 1011, -677, 4706, 20936],
    [46, -122, 336, -431, 942, -549, 4156, 20829],
    [47, -123, 327, -404, 868, -418, 3629, 20679],
    [47, -122, 316, -375, 792, -285, 3124, 20488],
    [47, -120, 303, -344, 714, -151, 2644, 20256],
    [46, -117, 289, -310, 634, -17, 2188, 19985],
    [46, -114, 273, -275, 553, 117, 1758, 19675],
    [44, -108, 255, -237, 471, 247, 1356, 19327],
    [43, -103, 237, -199, 390, 373, 981, 18944],
    [42, -98, 218, -160, 310, 495, 633, 18527],
    [40, -91, 198, -121, 231, 611, 314, 18078],
    [38, -84, 178, -81, 153, 722, 22, 17599],
    [36, -76, 157, -43, 80, 824, -241, 17092],
    [34, -68, 135, -3, 8, 919, -476, 16558],
    [32, -61, 115, 34, -60, 1006, -683, 16001],
    [29, -52, 94, 70, -123, 1083, -862, 15422],
    [27, -44, 73, 106, -184, 1152, -1015, 14824],
    [25, -36, 53, 139, -239, 1211, -1142, 14210],
    [22, -27, 34, 170, -290, 1261, -1244, 13582],
    [20, -20, 16, 199, -335, 1301, -1322, 12942],
    [18, -12, -3, 226, -375, 1331, -1376, 12293],
    [15, -4, -19, 250, -410, 1351, -1408, 11638],
    [13, 3, -35, 272, -439, 1361, -1419, 10979],
    [11, 9, -49, 292, -464, 1362, -1410, 10319],
    [9, 16, -63, 309, -483, 1354, -1383, 9660],
    [7, 22, -75, 322, -496, 1337, -1339, 9005],
    [6, 26, -85, 333, -504, 1312, -1280, 8355],
    [4, 31, -94, 341, -507, 1278, -1205, 7713],
    [3, 35, -102, 347, -506, 1238, -1119, 7082],
    [1, 40, -110, 350, -499, 1190, -1021, 6464],
    [0, 43, -115, 350, -488, 1136, -914, 5861],
];
