//! Event-level quantities: identifiers, trigger words, pileup density, MET.

use gg_core::{Error, FourMomentum, Result, test_bit_u64};
use gg_tree::{Column, ColumnType, EventSource};

/// Snapshot of the event-level branches for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventInfo {
    run: i64,
    lumi_block: i64,
    event: i64,
    rho: f64,
    hlt_ele_mu_x: u64,
    hlt_pho: u64,
    hlt_jet: u64,
    hlt_ele_mu_x_prescaled: u64,
    hlt_pho_prescaled: u64,
    hlt_jet_prescaled: u64,
    met: FourMomentum,
    gen_met: Option<FourMomentum>,
}

impl EventInfo {
    /// Run number.
    pub fn run(&self) -> i64 {
        self.run
    }

    /// Luminosity block.
    pub fn lumi_block(&self) -> i64 {
        self.lumi_block
    }

    /// Event number.
    pub fn event(&self) -> i64 {
        self.event
    }

    /// Median pileup energy density.
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Lepton trigger bit (`HLTEleMuX`).
    pub fn lep_trigger(&self, bit: u32) -> Result<bool> {
        test_bit_u64(self.hlt_ele_mu_x, bit, "HLTEleMuX")
    }

    /// Photon trigger bit (`HLTPho`).
    pub fn pho_trigger(&self, bit: u32) -> Result<bool> {
        test_bit_u64(self.hlt_pho, bit, "HLTPho")
    }

    /// Jet trigger bit (`HLTJet`).
    pub fn jet_trigger(&self, bit: u32) -> Result<bool> {
        test_bit_u64(self.hlt_jet, bit, "HLTJet")
    }

    /// Lepton trigger prescale flag.
    pub fn lep_trigger_prescaled(&self, bit: u32) -> Result<bool> {
        test_bit_u64(self.hlt_ele_mu_x_prescaled, bit, "HLTEleMuXIsPrescaled")
    }

    /// Photon trigger prescale flag.
    pub fn pho_trigger_prescaled(&self, bit: u32) -> Result<bool> {
        test_bit_u64(self.hlt_pho_prescaled, bit, "HLTPhoIsPrescaled")
    }

    /// Jet trigger prescale flag.
    pub fn jet_trigger_prescaled(&self, bit: u32) -> Result<bool> {
        test_bit_u64(self.hlt_jet_prescaled, bit, "HLTJetIsPrescaled")
    }

    /// Particle-flow MET as a massless transverse four-vector.
    pub fn met(&self) -> &FourMomentum {
        &self.met
    }

    /// Generator MET; `None` on data.
    pub fn gen_met(&self) -> Option<&FourMomentum> {
        self.gen_met.as_ref()
    }
}

struct GenMet<'a> {
    pt: &'a Column,
    phi: &'a Column,
}

/// Reads [`EventInfo`] from the scalar event branches.
pub struct EventInfoFactory<'a> {
    run: &'a Column,
    lumis: &'a Column,
    event: &'a Column,
    rho: &'a Column,
    triggers: [&'a Column; 6],
    met: &'a Column,
    met_phi: &'a Column,
    gen_met: Option<GenMet<'a>>,
    info: EventInfo,
}

const TRIGGER_BRANCHES: [&str; 6] = [
    "HLTEleMuX",
    "HLTPho",
    "HLTJet",
    "HLTEleMuXIsPrescaled",
    "HLTPhoIsPrescaled",
    "HLTJetIsPrescaled",
];

impl<'a> EventInfoFactory<'a> {
    /// Bind the event branches; `genMET`/`genMETPhi` only on simulation.
    pub fn new<S>(source: &'a S, is_data: bool) -> Result<Self>
    where
        S: EventSource + ?Sized,
    {
        let ints = |t: ColumnType| matches!(t, ColumnType::I32 | ColumnType::I64);
        let floats = |t: ColumnType| matches!(t, ColumnType::F32 | ColumnType::F64);
        let words = |t: ColumnType| matches!(t, ColumnType::U64 | ColumnType::I64);

        let mut triggers = Vec::with_capacity(TRIGGER_BRANCHES.len());
        for name in TRIGGER_BRANCHES {
            triggers.push(scalar(source, name, "scalar u64", words)?);
        }
        let triggers: [&'a Column; 6] = triggers
            .try_into()
            .map_err(|_| Error::Validation("trigger word bindings incomplete".into()))?;

        let gen_met = if is_data {
            None
        } else {
            Some(GenMet {
                pt: scalar(source, "genMET", "scalar f32", floats)?,
                phi: scalar(source, "genMETPhi", "scalar f32", floats)?,
            })
        };

        Ok(Self {
            run: scalar(source, "run", "scalar integer", ints)?,
            lumis: scalar(source, "lumis", "scalar integer", ints)?,
            event: scalar(source, "event", "scalar integer", ints)?,
            rho: scalar(source, "rho", "scalar f32", floats)?,
            triggers,
            met: scalar(source, "pfMET", "scalar f32", floats)?,
            met_phi: scalar(source, "pfMETPhi", "scalar f32", floats)?,
            gen_met,
            info: EventInfo::default(),
        })
    }

    /// Read `event`.
    pub fn run(&mut self, event: usize) -> Result<()> {
        let [ele_mu_x, pho, jet, ele_mu_x_pre, pho_pre, jet_pre] =
            self.triggers.map(|c| c.scalar_at(event).map(|v| v.to_u64()));
        let met = self.met.scalar_at(event)?.to_f64();
        let met_phi = self.met_phi.scalar_at(event)?.to_f64();
        let gen_met = match &self.gen_met {
            Some(g) => Some(FourMomentum::from_pt_eta_phi_m(
                g.pt.scalar_at(event)?.to_f64(),
                0.0,
                g.phi.scalar_at(event)?.to_f64(),
                0.0,
            )),
            None => None,
        };
        self.info = EventInfo {
            run: self.run.scalar_at(event)?.to_i64(),
            lumi_block: self.lumis.scalar_at(event)?.to_i64(),
            event: self.event.scalar_at(event)?.to_i64(),
            rho: self.rho.scalar_at(event)?.to_f64(),
            hlt_ele_mu_x: ele_mu_x?,
            hlt_pho: pho?,
            hlt_jet: jet?,
            hlt_ele_mu_x_prescaled: ele_mu_x_pre?,
            hlt_pho_prescaled: pho_pre?,
            hlt_jet_prescaled: jet_pre?,
            met: FourMomentum::from_pt_eta_phi_e(met, 0.0, met_phi, 0.0),
            gen_met,
        };
        Ok(())
    }

    /// Values for the last event read.
    pub fn info(&self) -> &EventInfo {
        &self.info
    }
}

fn scalar<'a, S>(
    source: &'a S,
    name: &str,
    expected: &str,
    ok: impl Fn(ColumnType) -> bool,
) -> Result<&'a Column>
where
    S: EventSource + ?Sized,
{
    let column = source.column(name)?;
    if column.is_jagged() || !ok(column.column_type()) {
        let shape = if column.is_jagged() { "jagged" } else { "scalar" };
        return Err(Error::BranchType {
            branch: name.to_string(),
            expected: expected.to_string(),
            found: format!("{shape} {}", column.column_type()),
        });
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gg_tree::TreeBuilder;

    fn builder() -> TreeBuilder {
        TreeBuilder::new("t", 1)
            .scalar_i64("run", &[297050])
            .scalar_i64("lumis", &[12])
            .scalar_i64("event", &[123456789])
            .scalar_f32("rho", &[21.5])
            .scalar_u64("HLTEleMuX", &[1 << 3])
            .scalar_u64("HLTPho", &[0])
            .scalar_u64("HLTJet", &[1 << 40])
            .scalar_u64("HLTEleMuXIsPrescaled", &[0])
            .scalar_u64("HLTPhoIsPrescaled", &[0])
            .scalar_u64("HLTJetIsPrescaled", &[1 << 39])
            .scalar_f32("pfMET", &[120.0])
            .scalar_f32("pfMETPhi", &[1.0])
    }

    #[test]
    fn data_event() {
        let t = builder().build().unwrap();
        let mut f = EventInfoFactory::new(&t, true).unwrap();
        f.run(0).unwrap();
        let info = f.info();
        assert_eq!(info.run(), 297050);
        assert_eq!(info.event(), 123456789);
        assert!(info.jet_trigger(40).unwrap());
        assert!(!info.jet_trigger(39).unwrap());
        assert!(info.jet_trigger_prescaled(39).unwrap());
        assert!(info.lep_trigger(3).unwrap());
        assert!(matches!(info.jet_trigger(64), Err(Error::InvalidBit { width: 64, .. })));
        assert_relative_eq!(info.met().pt(), 120.0, epsilon = 1e-9);
        assert_relative_eq!(info.met().phi(), 1.0, epsilon = 1e-9);
        assert!(info.gen_met().is_none());
    }

    #[test]
    fn simulation_needs_gen_met() {
        let t = builder().build().unwrap();
        assert!(matches!(EventInfoFactory::new(&t, false), Err(Error::UnknownBranch(_))));

        let t = builder()
            .scalar_f32("genMET", &[80.0])
            .scalar_f32("genMETPhi", &[-2.0])
            .build()
            .unwrap();
        let mut f = EventInfoFactory::new(&t, false).unwrap();
        f.run(0).unwrap();
        assert_relative_eq!(f.info().gen_met().unwrap().pt(), 80.0, epsilon = 1e-9);
    }
}
